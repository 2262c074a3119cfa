//! A plan is a sequence of actions leading from one state towards another.
//! The episode drivers use it to accumulate the realised trajectory and
//! report its cost.

use crate::search::Action;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, PartialEq)]
pub struct Plan<S> {
    steps: Vec<Action<S>>,
}

impl<S> Plan<S> {
    pub fn empty() -> Self {
        Self { steps: vec![] }
    }

    pub fn new(steps: Vec<Action<S>>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, action: Action<S>) {
        self.steps.push(action);
    }

    pub fn steps(&self) -> &[Action<S>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Total cost of the plan, the sum of the traversed edge weights.
    pub fn cost(&self) -> f64 {
        self.steps.iter().map(|action| action.cost).sum()
    }
}

impl<S> IntoIterator for Plan<S> {
    type Item = Action<S>;
    type IntoIter = std::vec::IntoIter<Action<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<S> Deref for Plan<S> {
    type Target = [Action<S>];

    fn deref(&self) -> &Self::Target {
        &self.steps
    }
}

impl<S> DerefMut for Plan<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn cost_sums_edge_weights() {
        let mut plan = Plan::empty();
        assert_approx_eq!(plan.cost(), 0.0);
        plan.push(Action::new((0, 0), (0, 1), 1.0));
        plan.push(Action::new((0, 1), (1, 1), 2.5));
        assert_eq!(plan.len(), 2);
        assert_approx_eq!(plan.cost(), 3.5);
    }
}
