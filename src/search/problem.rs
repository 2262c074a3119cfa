use crate::grid::{Cell, MazeGraph};
use crate::search::Action;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// The abstraction every agent searches over. States are opaque to the
/// agents: hashable, comparable, nothing more.
pub trait Problem: Debug {
    type State: Clone + Eq + Hash + Debug;

    /// All legal transitions out of `state`, in a stable enumeration order.
    fn actions(&self, state: &Self::State) -> Vec<Action<Self::State>>;

    /// The state an action leads to. Applying an action outside the state
    /// it was enumerated from is a caller bug.
    fn apply(&self, state: &Self::State, action: &Action<Self::State>) -> Self::State {
        debug_assert_eq!(
            &action.from, state,
            "action applied outside its origin state"
        );
        action.to.clone()
    }

    /// Cost of traversing `action` out of `state`.
    fn cost(
        &self,
        _state: &Self::State,
        action: &Action<Self::State>,
        _next: &Self::State,
    ) -> f64 {
        action.cost
    }

    /// Admissible estimate of the remaining cost from `state` to the goal.
    fn heuristic(&self, state: &Self::State) -> f64;

    fn is_goal(&self, state: &Self::State) -> bool;
}

/// The extra surface the reactive replanning layer needs: a sensor that
/// reports blocked states near the agent, and subgraph construction for the
/// reduced-knowledge subproblems built on reconnect.
pub trait ReactiveProblem: Problem {
    /// Blocked states visible from `state`.
    fn observe(&self, state: &Self::State) -> HashSet<Self::State>;

    /// A fresh problem over the graph with `excluded` removed. The result
    /// carries no obstacle knowledge of its own; everything the caller
    /// wants excluded must be in `excluded`.
    fn restrict(&self, excluded: &HashSet<Self::State>) -> Self;
}

/// An online search problem over a grid maze. The graph is immutable for
/// the lifetime of the problem; the Manhattan distance to the goal is the
/// heuristic, admissible because every edge weighs at least one.
#[derive(Debug, Clone)]
pub struct MazeProblem {
    graph: Rc<MazeGraph>,
    initial: Cell,
    goal: Cell,
}

impl MazeProblem {
    pub fn new(graph: Rc<MazeGraph>, initial: Cell, goal: Cell) -> Self {
        Self {
            graph,
            initial,
            goal,
        }
    }

    pub fn initial(&self) -> Cell {
        self.initial
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }
}

fn manhattan(state: Cell, goal: Cell) -> f64 {
    f64::from((state.0 - goal.0).abs() + (state.1 - goal.1).abs())
}

impl Problem for MazeProblem {
    type State = Cell;

    fn actions(&self, state: &Cell) -> Vec<Action<Cell>> {
        self.graph
            .neighbors(*state)
            .map(|neighbor| {
                let weight = self
                    .graph
                    .weight(*state, neighbor)
                    .unwrap_or(f64::INFINITY);
                Action::new(*state, neighbor, weight)
            })
            .collect()
    }

    fn heuristic(&self, state: &Cell) -> f64 {
        manhattan(*state, self.goal)
    }

    fn is_goal(&self, state: &Cell) -> bool {
        *state == self.goal
    }
}

/// A maze problem whose graph is a superset of the traversable world: some
/// cells are blocked. Blocked cells never show up as actions, but they stay
/// in the graph so the reactive layer can hold an obstacle-free ideal view
/// and sense blockages when adjacent to them.
#[derive(Debug, Clone)]
pub struct ObstacleMazeProblem {
    graph: Rc<MazeGraph>,
    initial: Cell,
    goal: Cell,
    obstacles: HashSet<Cell>,
}

impl ObstacleMazeProblem {
    pub fn new(
        graph: Rc<MazeGraph>,
        initial: Cell,
        goal: Cell,
        obstacles: HashSet<Cell>,
    ) -> Self {
        debug_assert!(!obstacles.contains(&initial), "start is never an obstacle");
        debug_assert!(!obstacles.contains(&goal), "goal is never an obstacle");
        Self {
            graph,
            initial,
            goal,
            obstacles,
        }
    }

    pub fn initial(&self) -> Cell {
        self.initial
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    /// The obstacle-free view of the same world, for ideal-tree building.
    pub fn ideal_view(&self) -> MazeProblem {
        MazeProblem::new(self.graph.clone(), self.initial, self.goal)
    }
}

impl Problem for ObstacleMazeProblem {
    type State = Cell;

    fn actions(&self, state: &Cell) -> Vec<Action<Cell>> {
        self.graph
            .neighbors(*state)
            .filter(|neighbor| !self.obstacles.contains(neighbor))
            .map(|neighbor| {
                let weight = self
                    .graph
                    .weight(*state, neighbor)
                    .unwrap_or(f64::INFINITY);
                Action::new(*state, neighbor, weight)
            })
            .collect()
    }

    fn heuristic(&self, state: &Cell) -> f64 {
        manhattan(*state, self.goal)
    }

    fn is_goal(&self, state: &Cell) -> bool {
        *state == self.goal
    }
}

impl ReactiveProblem for ObstacleMazeProblem {
    fn observe(&self, state: &Cell) -> HashSet<Cell> {
        self.graph
            .neighbors(*state)
            .filter(|neighbor| self.obstacles.contains(neighbor))
            .collect()
    }

    fn restrict(&self, excluded: &HashSet<Cell>) -> Self {
        Self {
            graph: Rc::new(self.graph.restrict(excluded)),
            initial: self.initial,
            goal: self.goal,
            obstacles: HashSet::new(),
        }
    }
}
