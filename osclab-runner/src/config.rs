//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [oscillator]
//! type = "MACD"
//! short = 12
//! long = 26
//!
//! [policy]
//! min_gain = 0.02
//! stop_loss = 0.05
//! first_opportunity = true
//!
//! [costs]
//! commission = 0.005
//! budget = 100.0
//! ```
//!
//! `[policy]` and `[costs]` are optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use osclab_core::{GainConfig, InputError, Macd, Oscillator, PolicyConfig, Ultimate};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid oscillator: {0}")]
    Oscillator(String),
    #[error(transparent)]
    Value(#[from] InputError),
}

/// Oscillator selection (serializable enum).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OscillatorConfig {
    /// Difference of two simple moving averages.
    Macd { short: usize, long: usize },
    /// Ultimate oscillator over days, 2*days and 3*days.
    Ultimate { days: usize },
}

impl OscillatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            OscillatorConfig::Macd { short, long } => {
                if short == 0 || short >= long {
                    return Err(ConfigError::Oscillator(format!(
                        "MACD requires 0 < short < long (got short={short}, long={long})"
                    )));
                }
            }
            OscillatorConfig::Ultimate { days } => {
                if days == 0 {
                    return Err(ConfigError::Oscillator(
                        "ULTIMATE requires days >= 1".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Instantiate the oscillator. Call `validate()` first.
    pub fn build(&self) -> Box<dyn Oscillator> {
        match *self {
            OscillatorConfig::Macd { short, long } => Box::new(Macd::new(short, long)),
            OscillatorConfig::Ultimate { days } => Box::new(Ultimate::new(days)),
        }
    }
}

/// Everything needed to reproduce one backtest on one series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub oscillator: OscillatorConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub costs: GainConfig,
}

impl BacktestConfig {
    pub fn new(oscillator: OscillatorConfig) -> Self {
        Self {
            oscillator,
            policy: PolicyConfig::default(),
            costs: GainConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_costs(mut self, costs: GainConfig) -> Self {
        self.costs = costs;
        self
    }

    /// Parse and validate a TOML config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.oscillator.validate()?;
        self.policy.validate()?;
        self.costs.validate()?;
        Ok(())
    }

    /// Content hash of the canonical JSON form. Equal configs hash equal.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).expect("BacktestConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
