//! The bounded best-first search shared by the lookahead agents. Effort is
//! capped by a count of distinct node expansions, never by wall-clock time,
//! so behaviour is deterministic for a given problem and heuristic table.

use crate::search::{Action, HeuristicTable, Problem, SearchStatistics};
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// What one bounded search call produced. The g values and parent pointers
/// are only meaningful for states reached in this call; they are rebuilt
/// from scratch on every search.
#[derive(Debug, Clone)]
pub struct SearchOutcome<S> {
    /// The last state popped from the frontier, whether because it was the
    /// goal or because the expansion budget ran out. `None` only when the
    /// frontier was empty from the start.
    pub boundary: Option<S>,
    /// The states expanded this call, in expansion order.
    pub closed: Vec<S>,
    g: HashMap<S, f64>,
    parents: HashMap<S, Action<S>>,
}

impl<S> SearchOutcome<S>
where
    S: Clone + Eq + std::hash::Hash,
{
    /// Best known cost from the search start to `state`, infinite if the
    /// search never reached it.
    pub fn g_of(&self, state: &S) -> f64 {
        self.g.get(state).copied().unwrap_or(f64::INFINITY)
    }

    /// The cheapest known action sequence from `start` to `target` within
    /// the explored region, following the parent pointers recorded during
    /// the search. Empty if `target` is `start` or was never reached.
    pub fn path_to(&self, start: &S, target: &S) -> Vec<Action<S>> {
        let mut actions = vec![];
        let mut cursor = target.clone();
        while cursor != *start {
            match self.parents.get(&cursor) {
                Some(action) => {
                    cursor = action.from.clone();
                    actions.push(action.clone());
                }
                None => return vec![],
            }
        }
        actions.reverse();
        actions
    }
}

/// Run a best-first search from `start`, expanding at most `lookahead`
/// distinct states. The frontier is ordered by `f = g + h` with ties broken
/// by ascending insertion order; a g-improving re-insert reassigns the
/// insertion rank.
///
/// With `mark_dead_ends` set, a successor whose only action leads straight
/// back to the state being expanded is treated as a strict cul-de-sac: it
/// is pinned at `h = ∞` in the shared table instead of entering the
/// frontier, and the unbranching corridor behind it is pinned too, walking
/// parent pointers back until a state with more than two actions (or the
/// search start, or the goal) is found.
pub fn bounded_astar<P: Problem>(
    problem: &P,
    start: &P::State,
    h: &mut HeuristicTable<P::State>,
    lookahead: usize,
    mark_dead_ends: bool,
    statistics: &mut SearchStatistics,
) -> SearchOutcome<P::State> {
    statistics.increment_searches();

    let mut outcome = SearchOutcome {
        boundary: None,
        closed: vec![],
        g: HashMap::new(),
        parents: HashMap::new(),
    };

    let start_h = h.seed(start, problem);
    if start_h.is_infinite() {
        return outcome;
    }

    let mut open: PriorityQueue<P::State, Reverse<(OrderedFloat<f64>, u64)>> =
        PriorityQueue::new();
    let mut insertion_rank: u64 = 0;
    let mut expanded: HashSet<P::State> = HashSet::new();

    outcome.g.insert(start.clone(), 0.0);
    open.push(start.clone(), Reverse((OrderedFloat(start_h), insertion_rank)));
    insertion_rank += 1;

    while let Some((state, _)) = open.pop() {
        if expanded.contains(&state) {
            continue;
        }
        expanded.insert(state.clone());
        outcome.closed.push(state.clone());
        outcome.boundary = Some(state.clone());
        statistics.increment_expanded_nodes();

        if problem.is_goal(&state) {
            break;
        }
        if expanded.len() >= lookahead {
            break;
        }

        let g_state = outcome.g[&state];
        for action in problem.actions(&state) {
            let next = problem.apply(&state, &action);
            if expanded.contains(&next) {
                continue;
            }

            if mark_dead_ends
                && next != *start
                && !problem.is_goal(&next)
                && !h.is_unreachable(&next)
            {
                let onward = problem.actions(&next);
                if onward.len() == 1 && onward[0].to == state {
                    mark_dead_corridor(problem, h, &outcome.parents, start, &state, next, statistics);
                    continue;
                }
            }
            if h.is_unreachable(&next) {
                continue;
            }

            let tentative = g_state + problem.cost(&state, &action, &next);
            let improved = outcome
                .g
                .get(&next)
                .map_or(true, |&known| tentative < known);
            if improved {
                outcome.g.insert(next.clone(), tentative);
                outcome.parents.insert(next.clone(), action.clone());
                let f = tentative + h.seed(&next, problem);
                statistics.increment_generated_nodes(1);
                open.push(next.clone(), Reverse((OrderedFloat(f), insertion_rank)));
                insertion_rank += 1;
            }
        }
    }

    outcome
}

/// Permanently remove a cul-de-sac and the unbranching corridor leading
/// into it from future consideration.
fn mark_dead_corridor<P: Problem>(
    problem: &P,
    h: &mut HeuristicTable<P::State>,
    parents: &HashMap<P::State, Action<P::State>>,
    start: &P::State,
    entry: &P::State,
    dead_end: P::State,
    statistics: &mut SearchStatistics,
) {
    h.mark_unreachable(dead_end);
    statistics.increment_dead_ends_marked();

    let mut cursor = entry.clone();
    loop {
        if cursor == *start || problem.is_goal(&cursor) {
            break;
        }
        if problem.actions(&cursor).len() > 2 {
            break;
        }
        h.mark_unreachable(cursor.clone());
        statistics.increment_dead_ends_marked();
        match parents.get(&cursor) {
            Some(action) => cursor = action.from.clone(),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MazeGraph;
    use crate::search::MazeProblem;
    use assert_approx_eq::assert_approx_eq;
    use std::rc::Rc;

    fn grid_problem() -> MazeProblem {
        MazeProblem::new(Rc::new(MazeGraph::grid(3, 3)), (0, 0), (2, 2))
    }

    #[test]
    fn unbounded_search_stops_at_the_goal() {
        let problem = grid_problem();
        let mut h = HeuristicTable::new();
        let mut statistics = SearchStatistics::new();
        let outcome = bounded_astar(&problem, &(0, 0), &mut h, 100, false, &mut statistics);

        assert_eq!(outcome.boundary, Some((2, 2)));
        assert_eq!(outcome.closed[0], (0, 0));
        assert_approx_eq!(outcome.g_of(&(2, 2)), 4.0);

        let path = outcome.path_to(&(0, 0), &(2, 2));
        assert_eq!(path.len(), 4);
        assert_eq!(path[0].from, (0, 0));
        assert_eq!(path[3].to, (2, 2));
    }

    #[test]
    fn expansion_budget_is_a_hard_cap() {
        let problem = grid_problem();
        let mut h = HeuristicTable::new();
        let mut statistics = SearchStatistics::new();
        let outcome = bounded_astar(&problem, &(0, 0), &mut h, 3, false, &mut statistics);

        assert_eq!(outcome.closed.len(), 3);
        assert_eq!(outcome.boundary, outcome.closed.last().copied());
        assert_ne!(outcome.boundary, Some((2, 2)));
    }

    #[test]
    fn equal_f_ties_pop_in_insertion_order() {
        // On the uniform grid every frontier entry has f = 4, so the closed
        // list is exactly the insertion order.
        let problem = grid_problem();
        let mut h = HeuristicTable::new();
        let mut statistics = SearchStatistics::new();
        let outcome = bounded_astar(&problem, &(0, 0), &mut h, 4, false, &mut statistics);

        let first_actions = problem.actions(&(0, 0));
        assert_eq!(outcome.closed[0], (0, 0));
        assert_eq!(outcome.closed[1], first_actions[0].to);
        assert_eq!(outcome.closed[2], first_actions[1].to);
    }

    #[test]
    fn unreachable_start_yields_no_boundary() {
        let problem = grid_problem();
        let mut h = HeuristicTable::new();
        h.mark_unreachable((0, 0));
        let mut statistics = SearchStatistics::new();
        let outcome = bounded_astar(&problem, &(0, 0), &mut h, 10, false, &mut statistics);

        assert_eq!(outcome.boundary, None);
        assert!(outcome.closed.is_empty());
    }

    #[test]
    fn cul_de_sac_corridors_are_pinned_at_infinity() {
        // Start (0,0), goal (0,3). The corridor (0,1)-(1,1)-(2,1) points
        // towards the goal by Manhattan distance, so the search walks into
        // it before paying for the expensive (0,1)-(0,2) edge.
        let graph = MazeGraph::from_edges(&[
            ((0, 0), (0, 1), 1.0),
            ((0, 1), (1, 1), 1.0),
            ((1, 1), (2, 1), 1.0),
            ((0, 1), (0, 2), 9.0),
            ((0, 2), (0, 3), 1.0),
        ]);
        let problem = MazeProblem::new(Rc::new(graph), (0, 0), (0, 3));
        let mut h = HeuristicTable::new();
        let mut statistics = SearchStatistics::new();
        let outcome = bounded_astar(&problem, &(0, 0), &mut h, 100, true, &mut statistics);

        assert_eq!(outcome.boundary, Some((0, 3)));
        assert!(h.is_unreachable(&(2, 1)));
        assert!(h.is_unreachable(&(1, 1)));
        // The corridor walk stops at the branch point.
        assert!(!h.is_unreachable(&(0, 1)));
        assert!(!h.is_unreachable(&(0, 0)));
        assert_eq!(statistics.dead_ends_marked(), 2);
    }
}
