//! Follow the ideal tree, repair when it turns out to be wrong. The agent
//! walks a successor map computed against an obstacle-free view of the
//! world; when a newly sensed obstacle invalidates the next ideal step it
//! rebuilds a reduced-knowledge subproblem without every obstacle observed
//! so far and lets a real-time search strategy reconnect to the goal.

use crate::search::agents::{Agent, AgentStep, LrtaAgent, RtaaAgent};
use crate::search::{
    Action, Problem, ReactiveProblem, SearchError, SearchStatistics,
};
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use tracing::{info, warn};

/// Iteration cap for a single reconnection run. A subproblem that turns
/// out to be disconnected degrades into a stalled call instead of looping
/// forever.
const RECONNECT_STEP_LIMIT: usize = 10_000;

/// Which real-time strategy repairs the plan on reconnect.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[clap(rename_all = "kebab-case")]
pub enum ReconnectStrategyName {
    Lrta,
    Rtaa,
}

impl ReconnectStrategyName {
    /// Resolve a configured strategy name. An unrecognised name is a fatal
    /// configuration error, reported immediately and never defaulted.
    pub fn from_name(name: &str) -> Result<Self, SearchError> {
        match name {
            "lrta" => Ok(Self::Lrta),
            "rtaa" => Ok(Self::Rtaa),
            other => Err(SearchError::UnknownReconnectStrategy(other.to_string())),
        }
    }
}

/// The precomputed successor map the agent follows while the world matches
/// its obstacle-free view. Read-only once built.
#[derive(Debug, Clone)]
pub struct IdealTree<S> {
    successors: HashMap<S, S>,
}

impl<S> IdealTree<S>
where
    S: Clone + Eq + Hash,
{
    pub fn new(successors: HashMap<S, S>) -> Self {
        Self { successors }
    }

    /// Uniform-cost search outward from the goal, recording for every
    /// reached state its cheapest next hop towards the goal. Relies on the
    /// graph being undirected, so actions are traversable both ways.
    pub fn compute<P>(problem: &P, goal: &P::State) -> Self
    where
        P: Problem<State = S>,
    {
        let mut distance: HashMap<S, f64> = HashMap::from([(goal.clone(), 0.0)]);
        let mut successors: HashMap<S, S> = HashMap::new();
        let mut open: PriorityQueue<S, Reverse<OrderedFloat<f64>>> = PriorityQueue::new();
        open.push(goal.clone(), Reverse(OrderedFloat(0.0)));

        while let Some((state, Reverse(OrderedFloat(settled)))) = open.pop() {
            for action in problem.actions(&state) {
                let candidate = settled + action.cost;
                let improved = distance
                    .get(&action.to)
                    .map_or(true, |&known| candidate < known);
                if improved {
                    distance.insert(action.to.clone(), candidate);
                    successors.insert(action.to.clone(), state.clone());
                    open.push(action.to.clone(), Reverse(OrderedFloat(candidate)));
                }
            }
        }
        Self { successors }
    }

    /// The ideal next state from `state`, if the tree covers it. The goal
    /// itself has no successor.
    pub fn successor(&self, state: &S) -> Option<&S> {
        self.successors.get(state)
    }

    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }
}

#[derive(Debug)]
pub struct FritAgent<P: ReactiveProblem> {
    problem: Rc<P>,
    strategy: ReconnectStrategyName,
    /// Expansion cap handed to the reconnection strategy.
    search_depth: usize,
    ideal_tree: IdealTree<P::State>,
    current_plan: VecDeque<Action<P::State>>,
    observed_obstacles: HashSet<P::State>,
    statistics: SearchStatistics,
}

impl<P: ReactiveProblem> FritAgent<P> {
    pub fn new(
        problem: Rc<P>,
        ideal_tree: IdealTree<P::State>,
        strategy: ReconnectStrategyName,
        search_depth: usize,
    ) -> Self {
        Self {
            problem,
            strategy,
            search_depth,
            ideal_tree,
            current_plan: VecDeque::new(),
            observed_obstacles: HashSet::new(),
            statistics: SearchStatistics::new(),
        }
    }

    pub fn reconnects(&self) -> i32 {
        self.statistics.reconnects()
    }

    /// Every obstacle sensed so far. Grows monotonically; nothing is ever
    /// forgotten.
    pub fn observed_obstacles(&self) -> &HashSet<P::State> {
        &self.observed_obstacles
    }

    pub fn finalise(&mut self) {
        self.statistics.finalise();
    }

    /// The next ideal action out of `state`, unless the ideal successor is
    /// missing, already known to be blocked, or unreachable in the real
    /// world (its action is absent because a sensor-visible obstacle sits
    /// there).
    fn follow_ideal_tree(&self, state: &P::State) -> Option<Action<P::State>> {
        let successor = self.ideal_tree.successor(state)?;
        if self.observed_obstacles.contains(successor) {
            return None;
        }
        self.problem
            .actions(state)
            .into_iter()
            .find(|action| action.to == *successor)
    }

    /// Merge freshly sensed obstacles, rebuild the reduced-knowledge
    /// subproblem and run the configured strategy to exhaustion towards
    /// the goal. Leaves the plan empty if the strategy could not reach it.
    fn reconnect(&mut self, state: &P::State) -> Result<(), SearchError> {
        self.observed_obstacles.extend(self.problem.observe(state));
        self.statistics.increment_reconnects();
        info!(
            ?state,
            observed = self.observed_obstacles.len(),
            strategy = ?self.strategy,
            "ideal plan invalidated, reconnecting"
        );

        self.current_plan.clear();
        let subproblem = Rc::new(self.problem.restrict(&self.observed_obstacles));
        let plan = match self.strategy {
            ReconnectStrategyName::Lrta => {
                let agent = LrtaAgent::new(subproblem.clone());
                run_to_goal(agent, subproblem.as_ref(), state.clone())?
            }
            ReconnectStrategyName::Rtaa => {
                let agent =
                    RtaaAgent::new(subproblem.clone(), self.search_depth, self.search_depth);
                run_to_goal(agent, subproblem.as_ref(), state.clone())?
            }
        };
        self.current_plan = plan.into();
        Ok(())
    }

    /// Whether the front of the plan leads onto a state that is no longer
    /// traversable from `state`. Reconnection plans are computed against the
    /// obstacles observed so far, so a later step can sit on an obstacle
    /// that was not visible when the plan was made; every step has to be
    /// re-validated against the real problem before it is taken.
    fn next_step_blocked(&self, state: &P::State) -> bool {
        match self.current_plan.front() {
            Some(next) if next.from == *state => !self
                .problem
                .actions(state)
                .iter()
                .any(|action| action.to == next.to),
            _ => false,
        }
    }
}

/// Drive a reconnection agent until it reports the goal, stalls, or runs
/// out of its iteration budget, collecting the realised actions as the new
/// plan. Anything short of reaching the goal yields an empty plan.
fn run_to_goal<P, A>(
    mut agent: A,
    problem: &P,
    start: P::State,
) -> Result<Vec<Action<P::State>>, SearchError>
where
    P: Problem,
    A: Agent<P>,
{
    let mut state = start;
    let mut plan = vec![];
    for _ in 0..RECONNECT_STEP_LIMIT {
        match agent.act(&state)? {
            AgentStep::Goal => return Ok(plan),
            AgentStep::Move(action) => {
                state = problem.apply(&state, &action);
                plan.push(action);
            }
            AgentStep::MoveMany(actions) => {
                for action in actions {
                    state = problem.apply(&state, &action);
                    plan.push(action);
                }
            }
            AgentStep::Stalled => break,
        }
    }
    Ok(vec![])
}

impl<P: ReactiveProblem> Agent<P> for FritAgent<P> {
    fn act(&mut self, state: &P::State) -> Result<AgentStep<P::State>, SearchError> {
        if self.problem.is_goal(state) {
            return Ok(AgentStep::Goal);
        }

        if self.current_plan.is_empty() {
            if let Some(action) = self.follow_ideal_tree(state) {
                return Ok(AgentStep::Move(action));
            }
            self.reconnect(state)?;
        } else if self.next_step_blocked(state) {
            warn!(?state, "planned step is blocked, replanning");
            self.reconnect(state)?;
        }

        match self.current_plan.pop_front() {
            Some(action) if action.from == *state => Ok(AgentStep::Move(action)),
            Some(action) => {
                warn!(?state, planned_from = ?action.from, "plan out of sync, dropping it");
                self.current_plan.clear();
                Ok(AgentStep::Stalled)
            }
            None => Ok(AgentStep::Stalled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MazeGraph;
    use crate::search::{MazeProblem, ObstacleMazeProblem, Plan};

    fn run_episode(
        agent: &mut FritAgent<ObstacleMazeProblem>,
        problem: &ObstacleMazeProblem,
        limit: usize,
    ) -> (Plan<(i32, i32)>, bool) {
        let mut state = problem.initial();
        let mut trajectory = Plan::empty();
        for _ in 0..limit {
            match agent.act(&state).unwrap() {
                AgentStep::Goal => return (trajectory, true),
                AgentStep::Move(action) => {
                    state = problem.apply(&state, &action);
                    trajectory.push(action);
                }
                AgentStep::Stalled => return (trajectory, false),
                step => panic!("unexpected step {step:?}"),
            }
        }
        (trajectory, false)
    }

    /// The ideal path from `start`, as the chain of tree successors.
    fn ideal_path(tree: &IdealTree<(i32, i32)>, start: (i32, i32)) -> Vec<(i32, i32)> {
        let mut path = vec![];
        let mut cursor = start;
        while let Some(&next) = tree.successor(&cursor) {
            path.push(next);
            cursor = next;
        }
        path
    }

    #[test]
    fn ideal_tree_points_towards_the_goal() {
        let problem = MazeProblem::new(Rc::new(MazeGraph::grid(3, 3)), (0, 0), (2, 2));
        let tree = IdealTree::compute(&problem, &(2, 2));
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.successor(&(2, 2)), None);
        for row in 0..3 {
            for col in 0..3 {
                if (row, col) == (2, 2) {
                    continue;
                }
                let &next = tree.successor(&(row, col)).unwrap();
                let here = problem.heuristic(&(row, col));
                let there = problem.heuristic(&next);
                assert_eq!(there, here - 1.0);
            }
        }
    }

    #[test]
    fn obstacle_free_world_never_reconnects() {
        let graph = Rc::new(MazeGraph::grid(5, 5));
        let problem = ObstacleMazeProblem::new(graph, (0, 0), (4, 4), HashSet::new());
        let tree = IdealTree::compute(&problem.ideal_view(), &(4, 4));
        let mut agent = FritAgent::new(
            Rc::new(problem.clone()),
            tree,
            ReconnectStrategyName::Rtaa,
            20,
        );
        let (trajectory, reached) = run_episode(&mut agent, &problem, 100);
        assert!(reached);
        assert_eq!(agent.reconnects(), 0);
        assert_eq!(trajectory.len(), 8);
    }

    #[test]
    fn obstacle_on_the_ideal_path_triggers_exactly_one_reconnect() {
        let graph = Rc::new(MazeGraph::grid(5, 5));
        let ideal_view = MazeProblem::new(graph.clone(), (0, 0), (4, 4));
        let tree = IdealTree::compute(&ideal_view, &(4, 4));

        // Drop an obstacle on the second cell of the ideal path, so the
        // agent follows the tree for one step before sensing it.
        let path = ideal_path(&tree, (0, 0));
        let obstacle = path[1];
        assert_ne!(obstacle, (4, 4));
        let problem = ObstacleMazeProblem::new(
            graph,
            (0, 0),
            (4, 4),
            HashSet::from([obstacle]),
        );

        let mut agent = FritAgent::new(
            Rc::new(problem.clone()),
            tree,
            ReconnectStrategyName::Rtaa,
            50,
        );
        let (trajectory, reached) = run_episode(&mut agent, &problem, 200);

        assert!(reached);
        assert_eq!(agent.reconnects(), 1);
        assert!(agent.observed_obstacles().contains(&obstacle));
        for action in trajectory.steps() {
            assert_ne!(action.to, obstacle);
        }
    }

    #[test]
    fn lrta_reconnection_also_reaches_the_goal() {
        let graph = Rc::new(MazeGraph::grid(5, 5));
        let ideal_view = MazeProblem::new(graph.clone(), (0, 0), (4, 4));
        let tree = IdealTree::compute(&ideal_view, &(4, 4));
        let path = ideal_path(&tree, (0, 0));
        let obstacle = path[1];
        let problem = ObstacleMazeProblem::new(
            graph,
            (0, 0),
            (4, 4),
            HashSet::from([obstacle]),
        );

        let mut agent = FritAgent::new(
            Rc::new(problem.clone()),
            tree,
            ReconnectStrategyName::Lrta,
            5,
        );
        let (trajectory, reached) = run_episode(&mut agent, &problem, 500);
        assert!(reached);
        assert_eq!(agent.reconnects(), 1);
        for action in trajectory.steps() {
            assert_ne!(action.to, obstacle);
        }
    }

    #[test]
    fn plan_steps_are_revalidated_against_unobserved_obstacles() {
        // Two routes to (0,3). The top route is blocked at (0,1), sensed
        // from the start; the bottom route is blocked at (1,2), which is
        // out of sensor range when the first reconnection plan is made, so
        // that plan routes straight through it. The agent has to notice
        // the blocked step on arrival at (1,1) and replan over the
        // crossover edge instead of traversing the obstacle.
        let graph = Rc::new(MazeGraph::from_edges(&[
            ((0, 0), (0, 1), 1.0),
            ((0, 1), (0, 2), 1.0),
            ((0, 2), (0, 3), 1.0),
            ((0, 0), (1, 0), 1.0),
            ((1, 0), (1, 1), 1.0),
            ((1, 1), (1, 2), 1.0),
            ((1, 2), (1, 3), 1.0),
            ((1, 3), (0, 3), 1.0),
            ((1, 1), (0, 2), 2.0),
        ]));
        let ideal_view = MazeProblem::new(graph.clone(), (0, 0), (0, 3));
        let tree = IdealTree::compute(&ideal_view, &(0, 3));
        let obstacles = HashSet::from([(0, 1), (1, 2)]);
        let problem = ObstacleMazeProblem::new(graph, (0, 0), (0, 3), obstacles.clone());

        let mut agent = FritAgent::new(
            Rc::new(problem.clone()),
            tree,
            ReconnectStrategyName::Lrta,
            5,
        );
        let (trajectory, reached) = run_episode(&mut agent, &problem, 100);

        assert!(reached);
        assert_eq!(agent.reconnects(), 2);
        assert!(agent.observed_obstacles().contains(&(1, 2)));
        for action in trajectory.steps() {
            assert!(!obstacles.contains(&action.to));
        }
    }

    #[test]
    fn unreachable_goal_stalls_instead_of_spinning() {
        // (0,0)-(1,0) is cut off from the goal once the obstacle at (0,1)
        // is observed; the reconnection strategy exhausts its budget and
        // the call stalls.
        let graph = Rc::new(MazeGraph::from_edges(&[
            ((0, 0), (0, 1), 1.0),
            ((0, 1), (0, 2), 1.0),
            ((0, 2), (0, 3), 1.0),
            ((0, 0), (1, 0), 1.0),
        ]));
        let ideal_view = MazeProblem::new(graph.clone(), (0, 0), (0, 3));
        let tree = IdealTree::compute(&ideal_view, &(0, 3));
        let problem = ObstacleMazeProblem::new(
            graph,
            (0, 0),
            (0, 3),
            HashSet::from([(0, 1)]),
        );

        let mut agent = FritAgent::new(
            Rc::new(problem.clone()),
            tree,
            ReconnectStrategyName::Lrta,
            5,
        );
        assert_eq!(agent.act(&(0, 0)).unwrap(), AgentStep::Stalled);
        assert_eq!(agent.reconnects(), 1);
    }

    #[test]
    fn unknown_strategy_names_fail_fast() {
        assert_eq!(ReconnectStrategyName::from_name("rtaa").unwrap(), ReconnectStrategyName::Rtaa);
        assert_eq!(
            ReconnectStrategyName::from_name("dijkstra"),
            Err(SearchError::UnknownReconnectStrategy("dijkstra".to_string()))
        );
    }
}
