use itertools::Itertools;
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::UnGraphMap;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// A position in the grid, as (row, column).
pub type Cell = (i32, i32);

/// An undirected, positively weighted maze over grid cells.
#[derive(Debug, Clone, Default)]
pub struct MazeGraph {
    graph: UnGraphMap<Cell, f64>,
}

impl MazeGraph {
    /// The full lattice over `rows x cols` cells, all edge weights 1.
    pub fn grid(rows: i32, cols: i32) -> Self {
        let mut graph = UnGraphMap::new();
        for (row, col) in (0..rows).cartesian_product(0..cols) {
            graph.add_node((row, col));
            if row > 0 {
                graph.add_edge((row - 1, col), (row, col), 1.0);
            }
            if col > 0 {
                graph.add_edge((row, col - 1), (row, col), 1.0);
            }
        }
        Self { graph }
    }

    /// Build a graph from explicit weighted edges, for hand-crafted layouts.
    pub fn from_edges(edges: &[(Cell, Cell, f64)]) -> Self {
        let mut graph = UnGraphMap::new();
        for &(a, b, weight) in edges {
            graph.add_edge(a, b, weight);
        }
        Self { graph }
    }

    /// Carve a perfect maze out of the `rows x cols` lattice with a
    /// randomized depth-first search. Every cell is reachable from every
    /// other cell. Edge weights are 1, or drawn uniformly from `weights`
    /// when given.
    pub fn maze(
        rows: i32,
        cols: i32,
        rng: &mut impl Rng,
        weights: Option<RangeInclusive<u32>>,
    ) -> Self {
        let lattice = Self::grid(rows, cols);
        let start: Cell = (0, 0);
        let mut graph = UnGraphMap::new();
        graph.add_node(start);
        let mut stack = vec![start];
        let mut visited = HashSet::from([start]);
        while let Some(&current) = stack.last() {
            let unvisited: Vec<Cell> = lattice
                .neighbors(current)
                .filter(|neighbor| !visited.contains(neighbor))
                .collect();
            match unvisited.choose(rng) {
                Some(&next) => {
                    let weight = match &weights {
                        Some(range) => f64::from(rng.random_range(range.clone())),
                        None => 1.0,
                    };
                    graph.add_edge(current, next, weight);
                    visited.insert(next);
                    stack.push(next);
                }
                None => {
                    stack.pop();
                }
            }
        }
        Self { graph }
    }

    /// Carve a maze and pick an obstacle set. Obstacle cells stay in the
    /// graph (the reactive layer needs the superset view for its ideal tree
    /// and for sensing); the returned set identifies them. A cell only
    /// becomes an obstacle if removing it keeps `start` and `goal`
    /// connected, and `start`/`goal` themselves are never obstacles.
    pub fn maze_with_obstacles(
        rows: i32,
        cols: i32,
        rng: &mut impl Rng,
        weights: Option<RangeInclusive<u32>>,
        obstacle_probability: f64,
        start: Cell,
        goal: Cell,
    ) -> (Self, HashSet<Cell>) {
        let maze = Self::maze(rows, cols, rng, weights);
        let mut obstacles = HashSet::new();
        let cells: Vec<Cell> = maze.graph.nodes().collect();
        for cell in cells {
            if cell == start || cell == goal {
                continue;
            }
            if rng.random_bool(obstacle_probability) {
                obstacles.insert(cell);
                if !maze.restrict(&obstacles).has_path(start, goal) {
                    obstacles.remove(&cell);
                }
            }
        }
        (maze, obstacles)
    }

    /// A copy of the graph with the excluded cells (and their edges) removed.
    pub fn restrict(&self, excluded: &HashSet<Cell>) -> Self {
        let mut graph = self.graph.clone();
        for &cell in excluded {
            graph.remove_node(cell);
        }
        Self { graph }
    }

    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.graph.neighbors(cell)
    }

    pub fn weight(&self, a: Cell, b: Cell) -> Option<f64> {
        self.graph.edge_weight(a, b).copied()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.graph.contains_node(cell)
    }

    pub fn has_path(&self, from: Cell, to: Cell) -> bool {
        self.contains(from)
            && self.contains(to)
            && has_path_connecting(&self.graph, from, to, None)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
