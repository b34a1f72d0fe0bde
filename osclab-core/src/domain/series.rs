//! PriceSeries: validated, column-oriented price history.
//!
//! All engine logic addresses the dense `close`/`high`/`low` buffers by
//! position. The timestamp column is a side-array kept for reporting only.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use super::error::InputError;

/// Time-ordered price history with strictly increasing timestamps.
///
/// Constructed only through the validating constructors, so every
/// `PriceSeries` in circulation is duplicate-free and ordered. Deserialization
/// goes through `from_columns` as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesColumns")]
pub struct PriceSeries {
    timestamps: Vec<NaiveDateTime>,
    #[serde(with = "super::float_serde::vec")]
    close: Vec<f64>,
    #[serde(with = "super::float_serde::vec")]
    high: Vec<f64>,
    #[serde(with = "super::float_serde::vec")]
    low: Vec<f64>,
}

/// Unvalidated wire form of a `PriceSeries`.
#[derive(Deserialize)]
struct SeriesColumns {
    timestamps: Vec<NaiveDateTime>,
    #[serde(with = "super::float_serde::vec")]
    close: Vec<f64>,
    #[serde(with = "super::float_serde::vec")]
    high: Vec<f64>,
    #[serde(with = "super::float_serde::vec")]
    low: Vec<f64>,
}

impl TryFrom<SeriesColumns> for PriceSeries {
    type Error = InputError;

    fn try_from(c: SeriesColumns) -> Result<Self, Self::Error> {
        Self::from_columns(c.timestamps, c.close, c.high, c.low)
    }
}

impl PriceSeries {
    /// Build from row-oriented bars.
    pub fn from_bars(bars: &[Bar]) -> Result<Self, InputError> {
        let mut timestamps = Vec::with_capacity(bars.len());
        let mut close = Vec::with_capacity(bars.len());
        let mut high = Vec::with_capacity(bars.len());
        let mut low = Vec::with_capacity(bars.len());
        for bar in bars {
            timestamps.push(bar.timestamp);
            close.push(bar.close);
            high.push(bar.high);
            low.push(bar.low);
        }
        Self::from_columns(timestamps, close, high, low)
    }

    /// Build from close prices only; high and low mirror the close.
    pub fn from_closes(timestamps: Vec<NaiveDateTime>, close: Vec<f64>) -> Result<Self, InputError> {
        let high = close.clone();
        let low = close.clone();
        Self::from_columns(timestamps, close, high, low)
    }

    /// Build from columns. Duplicate timestamps are reported before ordering
    /// problems, regardless of where they sit in the series.
    pub fn from_columns(
        timestamps: Vec<NaiveDateTime>,
        close: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
    ) -> Result<Self, InputError> {
        let n = timestamps.len();
        InputError::check_len("close", n, close.len())?;
        InputError::check_len("high", n, high.len())?;
        InputError::check_len("low", n, low.len())?;

        let mut seen = HashSet::with_capacity(n);
        for (index, ts) in timestamps.iter().enumerate() {
            if !seen.insert(*ts) {
                return Err(InputError::DuplicateIndex {
                    index,
                    timestamp: *ts,
                });
            }
        }
        if let Some(index) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(InputError::Unordered { index: index + 1 });
        }

        Ok(Self {
            timestamps,
            close,
            high,
            low,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn timestamp(&self, index: usize) -> Option<NaiveDateTime> {
        self.timestamps.get(index).copied()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Row view of a single position.
    pub fn bar(&self, index: usize) -> Option<Bar> {
        Some(Bar {
            timestamp: *self.timestamps.get(index)?,
            close: self.close[index],
            high: self.high[index],
            low: self.low[index],
        })
    }
}
