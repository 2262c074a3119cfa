//! Grid and maze construction. The search core only ever sees these graphs
//! through the [`crate::search::Problem`] abstraction.

mod maze;

pub use maze::{Cell, MazeGraph};
