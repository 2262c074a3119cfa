use crate::search::{Action, Problem, SearchError};

/// What an agent decided to do for one call of the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep<S> {
    /// Traverse one edge.
    Move(Action<S>),
    /// Traverse several edges committed to in this call, in order.
    MoveMany(Vec<Action<S>>),
    /// The queried state is a goal; the episode is over.
    Goal,
    /// No action this call. The caller decides whether to re-invoke or give
    /// up; the agent has not failed, it just has nothing to commit to.
    Stalled,
}

impl<S> AgentStep<S> {
    /// The state the agent ends up in after this step, if it moved.
    pub fn destination(&self) -> Option<&S> {
        match self {
            AgentStep::Move(action) => Some(&action.to),
            AgentStep::MoveMany(actions) => actions.last().map(|action| &action.to),
            AgentStep::Goal | AgentStep::Stalled => None,
        }
    }
}

/// The per-step contract between an agent and its caller: the caller hands
/// over the current state, the agent answers with a step, the caller
/// applies it and loops. All computation happens synchronously inside
/// `act`; the only bound on per-call work is the agent's expansion limit.
pub trait Agent<P: Problem> {
    fn act(&mut self, state: &P::State) -> Result<AgentStep<P::State>, SearchError>;
}
