//! Knobs for the policy cycle and the gain evaluator.

use serde::{Deserialize, Serialize};

use crate::domain::InputError;

/// Policy cycle configuration.
///
/// The three knobs gate one algorithm; there is no separate code path per
/// combination.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum fractional gain before a sell edge may close (0 = any).
    #[serde(default)]
    pub min_gain: f64,
    /// Drawdown fraction that forces a close (0 = disabled).
    #[serde(default)]
    pub stop_loss: f64,
    /// After an ineligible sell edge, close at the first bar meeting `min_gain`
    /// instead of waiting for the next sell edge.
    #[serde(default)]
    pub first_opportunity: bool,
}

impl PolicyConfig {
    pub fn new(min_gain: f64, stop_loss: f64, first_opportunity: bool) -> Result<Self, InputError> {
        let config = Self {
            min_gain,
            stop_loss,
            first_opportunity,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("min_gain", self.min_gain)?;
        non_negative("stop_loss", self.stop_loss)
    }
}

pub const DEFAULT_COMMISSION: f64 = 0.005;
pub const DEFAULT_BUDGET: f64 = 100.0;

/// Costs and notional for the gain evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainConfig {
    /// Fraction charged per transaction; a round trip pays it twice.
    #[serde(default = "default_commission")]
    pub commission: f64,
    /// Notional used to express outperformance (100 = percent).
    #[serde(default = "default_budget")]
    pub budget: f64,
}

fn default_commission() -> f64 {
    DEFAULT_COMMISSION
}

fn default_budget() -> f64 {
    DEFAULT_BUDGET
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            commission: DEFAULT_COMMISSION,
            budget: DEFAULT_BUDGET,
        }
    }
}

impl GainConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("commission", self.commission)?;
        non_negative("budget", self.budget)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InputError::InvalidConfig { field, value })
    }
}
