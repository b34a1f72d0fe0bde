//! ActionMask: the boolean open/close mask produced by the policy engine.

use serde::{Deserialize, Serialize};

/// True exactly where an open or close executes. Marks alternate
/// open, close, open, ... starting with an open.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionMask(Vec<bool>);

impl ActionMask {
    pub(crate) fn flat(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub(crate) fn mark(&mut self, index: usize) {
        self.0[index] = true;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<bool> {
        self.0
    }

    /// Indices of true marks, in order.
    pub fn marks(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
    }

    pub fn mark_count(&self) -> usize {
        self.0.iter().filter(|&&m| m).count()
    }

    /// Odd mark count: the last open was never closed.
    pub fn has_unmatched_open(&self) -> bool {
        self.mark_count() % 2 == 1
    }
}

impl From<Vec<bool>> for ActionMask {
    fn from(v: Vec<bool>) -> Self {
        Self(v)
    }
}

impl AsRef<[bool]> for ActionMask {
    fn as_ref(&self) -> &[bool] {
        &self.0
    }
}
