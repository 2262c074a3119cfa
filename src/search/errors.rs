use thiserror::Error;

/// Fatal conditions surfaced to the caller. Locally recoverable situations
/// (missing heuristic entries, exhausted plans, dead-end corridors) are
/// handled inline by the agents and never show up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The bounded search could not produce a boundary state, i.e. the
    /// frontier was empty from the start. Fatal for the current episode.
    #[error("bounded search produced no boundary state from {0}")]
    SearchFailed(String),
    /// The agent was asked to act in a state with no legal actions.
    #[error("no applicable actions in state {0}")]
    NoApplicableActions(String),
    /// The reactive layer was configured with a strategy name it does not
    /// recognise. Reported at the point of use, never silently defaulted.
    #[error("unknown reconnection strategy `{0}`, expected `lrta` or `rtaa`")]
    UnknownReconnectStrategy(String),
}
