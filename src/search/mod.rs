pub mod agents;

mod action;
mod bounded_astar;
mod errors;
mod heuristic_table;
mod plan;
mod problem;
mod search_statistics;
mod verbosity;

pub use action::Action;
pub use bounded_astar::{bounded_astar, SearchOutcome};
pub use errors::SearchError;
pub use heuristic_table::{HeuristicTable, SharedHeuristicTable};
pub use plan::Plan;
pub use problem::{MazeProblem, ObstacleMazeProblem, Problem, ReactiveProblem};
pub use search_statistics::SearchStatistics;
pub use verbosity::Verbosity;
