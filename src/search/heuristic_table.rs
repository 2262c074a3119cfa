use crate::search::Problem;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// The learned heuristic table H. Entries are seeded lazily from the
/// problem's heuristic on first access and only ever increase afterwards,
/// with one exception: a state marked unreachable is pinned at infinity for
/// the lifetime of the table and no later update can lower it.
#[derive(Debug, Clone, Default)]
pub struct HeuristicTable<S> {
    values: HashMap<S, f64>,
}

/// Hand-off form of the table. The enclosing agent retains read/write
/// access while a reconnection strategy refines the same estimates, so
/// sharing is by reference, not by copy. Single logical search thread only.
pub type SharedHeuristicTable<S> = Rc<RefCell<HeuristicTable<S>>>;

impl<S> HeuristicTable<S>
where
    S: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn shared() -> SharedHeuristicTable<S> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn get(&self, state: &S) -> Option<f64> {
        self.values.get(state).copied()
    }

    /// The current estimate for `state`, inserting the problem heuristic if
    /// the table has none yet.
    pub fn seed<P>(&mut self, state: &S, problem: &P) -> f64
    where
        P: Problem<State = S>,
    {
        match self.values.get(state) {
            Some(&value) => value,
            None => {
                let value = problem.heuristic(state);
                self.values.insert(state.clone(), value);
                value
            }
        }
    }

    /// The current estimate for `state` without recording anything, falling
    /// back to the problem heuristic for unseen states.
    pub fn value_or<P>(&self, state: &S, problem: &P) -> f64
    where
        P: Problem<State = S>,
    {
        match self.values.get(state) {
            Some(&value) => value,
            None => problem.heuristic(state),
        }
    }

    /// Record a refined estimate. Unreachable states keep their infinite
    /// value no matter what the caller learned since.
    pub fn update(&mut self, state: S, value: f64) {
        match self.values.get_mut(&state) {
            Some(current) if current.is_infinite() => {}
            Some(current) => {
                debug_assert!(
                    value >= *current - 1e-9,
                    "heuristic estimates must not decrease ({value} < {current})"
                );
                *current = value;
            }
            None => {
                self.values.insert(state, value);
            }
        }
    }

    /// Permanently exclude `state` from minimisation.
    pub fn mark_unreachable(&mut self, state: S) {
        self.values.insert(state, f64::INFINITY);
    }

    pub fn is_unreachable(&self, state: &S) -> bool {
        self.get(state).is_some_and(f64::is_infinite)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
