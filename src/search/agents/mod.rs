mod agent;
mod frit;
mod lrta;
mod rtaa;

pub use agent::{Agent, AgentStep};
pub use frit::{FritAgent, IdealTree, ReconnectStrategyName};
pub use lrta::LrtaAgent;
pub use rtaa::RtaaAgent;
