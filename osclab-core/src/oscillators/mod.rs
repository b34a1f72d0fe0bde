//! Oscillators: raw buy/sell trigger conditions derived from a price series.
//!
//! Each oscillator computes a numeric series of the same length as the input
//! (NaN during warmup) and maps it to boolean `TriggerConditions`. NaN
//! values never satisfy a condition.

pub mod macd;
pub mod rolling;
pub mod ultimate;

pub use macd::Macd;
pub use ultimate::Ultimate;

use crate::domain::PriceSeries;
use crate::engine::TriggerConditions;

/// Trait for trigger-producing oscillators.
///
/// # Look-ahead guard
/// No value at bar t may depend on data from bar t+1 or later.
pub trait Oscillator: Send + Sync {
    /// Human-readable name (e.g., "macd_12_26").
    fn name(&self) -> &str;

    /// Number of leading bars that are always NaN.
    fn lookback(&self) -> usize;

    /// Oscillator values for the whole series.
    fn compute(&self, series: &PriceSeries) -> Vec<f64>;

    /// Map oscillator values to raw buy/sell conditions.
    fn conditions_from(&self, values: &[f64]) -> TriggerConditions;

    fn conditions(&self, series: &PriceSeries) -> TriggerConditions {
        self.conditions_from(&self.compute(series))
    }
}

/// Build a series with minute-spaced timestamps from close prices.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let base = chrono::NaiveDate::from_ymd_opt(2021, 1, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let ts = (0..closes.len())
        .map(|i| base + chrono::Duration::minutes(i as i64))
        .collect();
    PriceSeries::from_closes(ts, closes.to_vec()).unwrap()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
