//! OscLab Runner: backtest orchestration on top of `osclab-core`.
//!
//! This crate provides:
//! - TOML-configured backtest runs (oscillator + policy + costs)
//! - Parallel parameter sweeps and instrument sweeps with coarse cancellation
//! - JSON/CSV report export
//! - Deterministic synthetic price series

pub mod config;
pub mod export;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{BacktestConfig, ConfigError, OscillatorConfig};
pub use export::{export_json, export_leaderboard_csv, export_trades_csv, import_json, save_artifacts};
pub use runner::{run_backtest, run_with_triggers, BacktestResult, LedgerEntry, RunError};
pub use sweep::{CancelToken, ParamGrid, ParamSweep, SweepError, SweepResults};
pub use synthetic::{synthetic_bars, synthetic_series};
