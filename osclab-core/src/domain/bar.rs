//! Bar: one timestamped observation of an instrument.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Close price plus the high/low envelope of a single period.
///
/// Only `close` feeds the policy engine. `high` and `low` are consumed by
/// range-based oscillators (Ultimate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    #[serde(with = "crate::domain::float_serde")]
    pub close: f64,
    #[serde(with = "crate::domain::float_serde")]
    pub high: f64,
    #[serde(with = "crate::domain::float_serde")]
    pub low: f64,
}

impl Bar {
    /// A bar whose envelope collapses onto the close.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            timestamp,
            close,
            high: close,
            low: close,
        }
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.close.is_nan() || self.high.is_nan() || self.low.is_nan()
    }

    /// high >= close >= low and all prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low && self.high >= self.close && self.low <= self.close && self.low > 0.0
    }
}
