//! Simple MACD: difference of two simple moving averages of the close.
//!
//! Buy condition: macd > 0. Sell condition: macd < 0.
//! Lookback: long - 1.

use crate::domain::PriceSeries;
use crate::engine::TriggerConditions;

use super::rolling::rolling_mean;
use super::Oscillator;

#[derive(Debug, Clone)]
pub struct Macd {
    short: usize,
    long: usize,
    name: String,
}

impl Macd {
    /// Callers validate `0 < short < long` (see the runner config).
    pub fn new(short: usize, long: usize) -> Self {
        assert!(short >= 1 && short < long, "MACD requires 0 < short < long");
        Self {
            short,
            long,
            name: format!("macd_{short}_{long}"),
        }
    }
}

impl Oscillator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.long - 1
    }

    fn compute(&self, series: &PriceSeries) -> Vec<f64> {
        let fast = rolling_mean(series.close(), self.short);
        let slow = rolling_mean(series.close(), self.long);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }

    fn conditions_from(&self, values: &[f64]) -> TriggerConditions {
        TriggerConditions {
            buy: values.iter().map(|&v| v > 0.0).collect(),
            sell: values.iter().map(|&v| v < 0.0).collect(),
        }
    }
}
