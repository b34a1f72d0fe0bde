//! Ultimate oscillator over three nested windows (days, 2*days, 3*days).
//!
//! bp = close - min(prev_close, low)
//! tr = max(high, prev_close) - min(prev_close, low)
//! avg_k = sum(bp, k) / sum(tr, k)
//! ult = 100 * (4*avg_d + 2*avg_2d + avg_3d) / 7
//!
//! Buy condition: ult > 70. Sell condition: ult < 30.
//! Lookback: 3*days (the first bar has no previous close).

use crate::domain::PriceSeries;
use crate::engine::TriggerConditions;

use super::rolling::{nan_max, nan_min, rolling_sum};
use super::Oscillator;

pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct Ultimate {
    days: usize,
    name: String,
}

impl Ultimate {
    pub fn new(days: usize) -> Self {
        assert!(days >= 1, "Ultimate days must be >= 1");
        Self {
            days,
            name: format!("ultimate_{days}"),
        }
    }

    fn window_average(&self, bp: &[f64], tr: &[f64], period: usize) -> Vec<f64> {
        let bp_sum = rolling_sum(bp, period);
        let tr_sum = rolling_sum(tr, period);
        bp_sum.iter().zip(&tr_sum).map(|(b, t)| b / t).collect()
    }
}

impl Oscillator for Ultimate {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        3 * self.days
    }

    fn compute(&self, series: &PriceSeries) -> Vec<f64> {
        let close = series.close();
        let high = series.high();
        let low = series.low();
        let n = series.len();

        let mut bp = Vec::with_capacity(n);
        let mut tr = Vec::with_capacity(n);
        for i in 0..n {
            let prev = if i == 0 { f64::NAN } else { close[i - 1] };
            let floor = nan_min(prev, low[i]);
            bp.push(close[i] - floor);
            tr.push(nan_max(high[i], prev) - floor);
        }

        let avg1 = self.window_average(&bp, &tr, self.days);
        let avg2 = self.window_average(&bp, &tr, 2 * self.days);
        let avg3 = self.window_average(&bp, &tr, 3 * self.days);

        (0..n)
            .map(|i| 100.0 * (4.0 * avg1[i] + 2.0 * avg2[i] + avg3[i]) / 7.0)
            .collect()
    }

    fn conditions_from(&self, values: &[f64]) -> TriggerConditions {
        TriggerConditions {
            buy: values.iter().map(|&v| v > OVERBOUGHT).collect(),
            sell: values.iter().map(|&v| v < OVERSOLD).collect(),
        }
    }
}
