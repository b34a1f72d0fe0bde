//! Edge detector: "condition is true" → "condition just flipped".

use serde::{Deserialize, Serialize};

use crate::domain::InputError;

/// Raw buy/sell conditions as produced by an oscillator, index-aligned with
/// the price series.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerConditions {
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

/// Buy/sell edges consumed by the policy cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerEdges {
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

impl TriggerConditions {
    pub fn len(&self) -> usize {
        self.buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty()
    }

    /// Detect edges on each side independently.
    pub fn edges(&self) -> Result<TriggerEdges, InputError> {
        InputError::check_len("sell conditions", self.buy.len(), self.sell.len())?;
        Ok(TriggerEdges {
            buy: detect_edges(&self.buy),
            sell: detect_edges(&self.sell),
        })
    }
}

impl TriggerEdges {
    pub fn len(&self) -> usize {
        self.buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty()
    }
}

/// `E[0] = C[0]`, `E[i] = C[i] XOR C[i-1]`.
///
/// A condition already true at the first bar counts as an edge.
pub fn detect_edges(conditions: &[bool]) -> Vec<bool> {
    let mut edges = Vec::with_capacity(conditions.len());
    let mut prev = false;
    for &c in conditions {
        edges.push(c != prev);
        prev = c;
    }
    edges
}
