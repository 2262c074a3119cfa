//! Learning real-time A*: depth-1 lookahead with local heuristic
//! minimisation. The agent tightens its estimate for the state it just
//! left, then greedily follows the cheapest one-step estimate from where
//! it stands. The heuristic converges towards exact values only over
//! repeated visits; a single pass may be arbitrarily suboptimal.

use crate::search::agents::{Agent, AgentStep};
use crate::search::{
    Action, HeuristicTable, Problem, SearchError, SearchStatistics, SharedHeuristicTable,
};
use std::rc::Rc;
use tracing::trace;

#[derive(Debug)]
pub struct LrtaAgent<P: Problem> {
    problem: Rc<P>,
    h: SharedHeuristicTable<P::State>,
    previous: Option<P::State>,
    statistics: SearchStatistics,
}

impl<P: Problem> LrtaAgent<P> {
    pub fn new(problem: Rc<P>) -> Self {
        Self::with_table(problem, HeuristicTable::shared())
    }

    /// Construct over an externally owned heuristic table. The hand-off is
    /// by reference: the external owner keeps read/write access and sees
    /// every estimate this agent learns.
    pub fn with_table(problem: Rc<P>, h: SharedHeuristicTable<P::State>) -> Self {
        Self {
            problem,
            h,
            previous: None,
            statistics: SearchStatistics::new(),
        }
    }

    pub fn heuristic_table(&self) -> SharedHeuristicTable<P::State> {
        self.h.clone()
    }

    pub fn finalise(&mut self) {
        self.statistics.finalise();
    }

    /// Cost of taking `action` plus the current estimate from its target.
    fn one_step_cost(&self, h: &HeuristicTable<P::State>, action: &Action<P::State>) -> f64 {
        action.cost + h.value_or(&action.to, &*self.problem)
    }
}

impl<P: Problem> Agent<P> for LrtaAgent<P> {
    fn act(&mut self, state: &P::State) -> Result<AgentStep<P::State>, SearchError> {
        if self.problem.is_goal(state) {
            self.previous = None;
            return Ok(AgentStep::Goal);
        }

        let mut h = self.h.borrow_mut();
        h.seed(state, &*self.problem);

        // Back up the estimate for the state we just left.
        if let Some(previous) = self.previous.take() {
            let backed_up = self
                .problem
                .actions(&previous)
                .iter()
                .map(|action| self.one_step_cost(&h, action))
                .fold(f64::INFINITY, f64::min);
            if backed_up.is_finite() {
                h.update(previous, backed_up);
                self.statistics.increment_heuristic_updates();
            }
        }

        // Greedy move by the updated estimate, first minimal action wins.
        let mut chosen: Option<(Action<P::State>, f64)> = None;
        for action in self.problem.actions(state) {
            let cost = self.one_step_cost(&h, &action);
            if chosen.as_ref().map_or(true, |(_, best)| cost < *best) {
                chosen = Some((action, cost));
            }
        }

        match chosen {
            Some((action, cost)) => {
                trace!(?state, to = ?action.to, cost, "lrta step");
                self.previous = Some(state.clone());
                Ok(AgentStep::Move(action))
            }
            None => Err(SearchError::NoApplicableActions(format!("{state:?}"))),
        }
    }
}
