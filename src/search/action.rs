/// A single legal transition between two adjacent states. Actions are plain
/// values rather than handles into the graph, which makes them comparable
/// and freely clonable; they are only meaningful in the state they were
/// enumerated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Action<S> {
    pub from: S,
    pub to: S,
    pub cost: f64,
}

impl<S> Action<S> {
    pub fn new(from: S, to: S, cost: f64) -> Self {
        Self { from, to, cost }
    }
}
