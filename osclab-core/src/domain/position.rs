use serde::{Deserialize, Serialize};

/// Position state inside one policy-cycle pass.
///
/// Entry bar and entry price travel together in the `Long` variant, so
/// there is no separate "last buy price" that could drift from the state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long {
        entry_index: usize,
        #[serde(with = "crate::domain::float_serde")]
        entry_price: f64,
    },
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }

    /// Fractional change from entry to `price`: `price / entry - 1`.
    ///
    /// `None` when flat. May be NaN or infinite for degenerate prices.
    pub fn gain_at(&self, price: f64) -> Option<f64> {
        match *self {
            Position::Flat => None,
            Position::Long { entry_price, .. } => Some(gain_between(entry_price, price)),
        }
    }
}

/// Fractional change from `entry` to `price`. Shared by the policy scan,
/// the gain evaluator and `Position::gain_at` so thresholds and reported
/// returns agree bit for bit.
#[inline]
pub(crate) fn gain_between(entry: f64, price: f64) -> f64 {
    price / entry - 1.0
}
