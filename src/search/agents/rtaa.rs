//! Real-time adaptive A*: bounded lookahead, bulk heuristic learning and
//! multi-step commitment. Each call runs one expansion-capped search, backs
//! the boundary estimate up through every expanded state with
//! `H[s] = g(s̄) + H(s̄) - g(s)`, then walks up to the movement budget along
//! the best in-region path towards the boundary. Strict cul-de-sacs found
//! while searching are pinned at infinity and never entered again.

use crate::search::agents::{Agent, AgentStep};
use crate::search::{
    bounded_astar, Action, HeuristicTable, Problem, SearchError, SearchStatistics,
    SharedHeuristicTable,
};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug)]
pub struct RtaaAgent<P: Problem> {
    problem: Rc<P>,
    h: SharedHeuristicTable<P::State>,
    /// Expansion cap per bounded search.
    lookahead: usize,
    /// Edges to traverse after each search before re-planning.
    movements: usize,
    visits: HashMap<P::State, u32>,
    statistics: SearchStatistics,
}

impl<P: Problem> RtaaAgent<P> {
    pub fn new(problem: Rc<P>, lookahead: usize, movements: usize) -> Self {
        Self::with_table(problem, lookahead, movements, HeuristicTable::shared())
    }

    /// Construct over an externally owned heuristic table. The hand-off is
    /// by reference: the external owner keeps read/write access and sees
    /// every estimate this agent learns.
    pub fn with_table(
        problem: Rc<P>,
        lookahead: usize,
        movements: usize,
        h: SharedHeuristicTable<P::State>,
    ) -> Self {
        Self {
            problem,
            h,
            lookahead,
            movements,
            visits: HashMap::new(),
            statistics: SearchStatistics::new(),
        }
    }

    pub fn heuristic_table(&self) -> SharedHeuristicTable<P::State> {
        self.h.clone()
    }

    /// How often the agent has stepped onto `state` so far.
    pub fn visit_count(&self, state: &P::State) -> u32 {
        self.visits.get(state).copied().unwrap_or(0)
    }

    pub fn finalise(&mut self) {
        self.statistics.finalise();
    }

    /// One greedy edge by the learned estimate, for lookaheads too small
    /// for the search to leave the current state.
    fn greedy_step(
        &self,
        h: &HeuristicTable<P::State>,
        state: &P::State,
    ) -> Result<Action<P::State>, SearchError> {
        let mut chosen: Option<(Action<P::State>, f64)> = None;
        for action in self.problem.actions(state) {
            let cost = action.cost + h.value_or(&action.to, &*self.problem);
            if cost.is_finite() && chosen.as_ref().map_or(true, |(_, best)| cost < *best) {
                chosen = Some((action, cost));
            }
        }
        chosen
            .map(|(action, _)| action)
            .ok_or_else(|| SearchError::SearchFailed(format!("{state:?}")))
    }
}

impl<P: Problem> Agent<P> for RtaaAgent<P> {
    fn act(&mut self, state: &P::State) -> Result<AgentStep<P::State>, SearchError> {
        if self.problem.is_goal(state) {
            return Ok(AgentStep::Goal);
        }

        let mut h = self.h.borrow_mut();
        let outcome = bounded_astar(
            &*self.problem,
            state,
            &mut h,
            self.lookahead,
            true,
            &mut self.statistics,
        );
        let boundary = outcome
            .boundary
            .clone()
            .ok_or_else(|| SearchError::SearchFailed(format!("{state:?}")))?;

        let h_boundary = h.seed(&boundary, &*self.problem);
        let g_boundary = outcome.g_of(&boundary);
        for expanded in &outcome.closed {
            let g_expanded = outcome.g_of(expanded);
            if g_boundary.is_finite() && g_expanded.is_finite() && !h.is_unreachable(expanded)
            {
                h.update(expanded.clone(), g_boundary + h_boundary - g_expanded);
                self.statistics.increment_heuristic_updates();
            }
        }

        let mut taken: Vec<Action<P::State>> = outcome
            .path_to(state, &boundary)
            .into_iter()
            .take(self.movements)
            .collect();
        if taken.is_empty() {
            taken.push(self.greedy_step(&h, state)?);
        }
        for action in &taken {
            *self.visits.entry(action.to.clone()).or_insert(0) += 1;
        }
        trace!(?state, ?boundary, steps = taken.len(), "rtaa step");
        Ok(AgentStep::MoveMany(taken))
    }
}
