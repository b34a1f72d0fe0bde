//! Backtest runner: wires oscillator, edge detector, policy cycle and gain
//! evaluator into one reproducible run.
//!
//! Two entry points:
//! - `run_backtest()`: config-driven; the configured oscillator supplies
//!   the raw trigger conditions.
//! - `run_with_triggers()`: caller-supplied raw conditions (external
//!   oscillators), same downstream pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use osclab_core::engine::CloseReason;
use osclab_core::{
    evaluate_gains, trace_policy_cycle, ActionMask, CycleAction, CycleTrace, GainConfig,
    GainReport, InputError, PolicyConfig, PriceSeries, TradeRecord, TriggerConditions,
};

use crate::config::{BacktestConfig, ConfigError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("input error: {0}")]
    Input(#[from] InputError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One closed trade with reporting context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub close_reason: CloseReason,
    #[serde(flatten)]
    pub trade: TradeRecord,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Hash of symbol, config and dataset; unique per run.
    pub run_id: String,
    pub config_hash: String,
    pub dataset_hash: String,
    pub symbol: String,
    pub oscillator: String,
    pub config: BacktestConfig,
    pub bar_count: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub mask: ActionMask,
    pub actions: Vec<CycleAction>,
    pub ledger: Vec<LedgerEntry>,
    pub report: GainReport,
}

impl BacktestResult {
    pub fn outperformance(&self) -> f64 {
        self.report.aggregate_outperformance
    }

    pub fn trade_count(&self) -> usize {
        self.report.trade_count()
    }
}

/// Content hash of a series: timestamps and every price column the
/// oscillators read.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for (i, ts) in series.timestamps().iter().enumerate() {
        hasher.update(&ts.and_utc().timestamp().to_le_bytes());
        for column in [series.close(), series.high(), series.low()] {
            hasher.update(&column[i].to_bits().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Deterministic run id from the symbol, config hash and dataset hash.
pub fn run_id(symbol: &str, config_hash: &str, dataset_hash: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(b"+");
    hasher.update(config_hash.as_bytes());
    hasher.update(b"+");
    hasher.update(dataset_hash.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Run one backtest with the configured oscillator.
pub fn run_backtest(
    symbol: &str,
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let oscillator = config.oscillator.build();
    let conditions = oscillator.conditions(series);

    let config_hash = config.config_hash();
    let dataset_hash = dataset_hash(series);
    let run_id = run_id(symbol, &config_hash, &dataset_hash);
    debug!(
        %symbol,
        oscillator = oscillator.name(),
        bars = series.len(),
        run_id = %&run_id[..12],
        "backtest start"
    );

    let (trace, report) = run_with_triggers(series, &conditions, &config.policy, &config.costs)?;
    let ledger = build_ledger(series, &trace, &report);

    debug!(
        %symbol,
        marks = trace.mask.mark_count(),
        trades = report.trade_count(),
        outperformance = report.aggregate_outperformance,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config_hash,
        dataset_hash,
        symbol: symbol.to_string(),
        oscillator: oscillator.name().to_string(),
        config: config.clone(),
        bar_count: series.len(),
        start: series.first_timestamp(),
        end: series.last_timestamp(),
        mask: trace.mask,
        actions: trace.actions,
        ledger,
        report,
    })
}

/// Edges → policy cycle → gains for externally supplied raw conditions.
pub fn run_with_triggers(
    series: &PriceSeries,
    conditions: &TriggerConditions,
    policy: &PolicyConfig,
    costs: &GainConfig,
) -> Result<(CycleTrace, GainReport), RunError> {
    let edges = conditions.edges()?;
    let trace = trace_policy_cycle(series.close(), &edges, policy)?;
    let report = evaluate_gains(series.close(), &trace.mask, costs)?;

    if let Some(index) = report.unmatched_open {
        warn!(
            index,
            "position still open at series end; excluded from trade accounting"
        );
    }
    Ok((trace, report))
}

/// Attach timestamps and close reasons to each trade. Trade k pairs
/// actions 2k (open) and 2k+1 (close).
fn build_ledger(series: &PriceSeries, trace: &CycleTrace, report: &GainReport) -> Vec<LedgerEntry> {
    let timestamps = series.timestamps();
    report
        .trades
        .iter()
        .zip(trace.actions.chunks_exact(2))
        .filter_map(|(trade, pair)| {
            Some(LedgerEntry {
                entry_time: timestamps[trade.entry_index],
                exit_time: timestamps[trade.exit_index],
                close_reason: pair[1].close_reason()?,
                trade: trade.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OscillatorConfig;
    use crate::synthetic::synthetic_series;

    fn macd_config() -> BacktestConfig {
        BacktestConfig::new(OscillatorConfig::Macd { short: 5, long: 20 })
    }

    #[test]
    fn run_records_identity_and_span() {
        let series = synthetic_series(500, 7).unwrap();
        let result = run_backtest("BTCUSD", &series, &macd_config()).unwrap();
        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.bar_count, 500);
        assert_eq!(result.mask.len(), 500);
        assert_eq!(result.oscillator, "macd_5_20");
        assert_eq!(result.start, series.first_timestamp());
        assert_eq!(result.end, series.last_timestamp());
        assert_eq!(result.ledger.len(), result.trade_count());
    }

    #[test]
    fn run_id_depends_on_config_and_data() {
        let a = synthetic_series(300, 1).unwrap();
        let b = synthetic_series(300, 2).unwrap();
        let r1 = run_backtest("X", &a, &macd_config()).unwrap();
        let r2 = run_backtest("X", &a, &macd_config()).unwrap();
        let r3 = run_backtest("X", &b, &macd_config()).unwrap();
        assert_eq!(r1.run_id, r2.run_id);
        assert_ne!(r1.run_id, r3.run_id);
        assert_eq!(r1, r2);
    }

    #[test]
    fn run_id_covers_high_low_envelope() {
        let base = synthetic_series(200, 9).unwrap();
        let widened: Vec<f64> = base.high().iter().map(|h| h * 1.05).collect();
        let other = PriceSeries::from_columns(
            base.timestamps().to_vec(),
            base.close().to_vec(),
            widened,
            base.low().to_vec(),
        )
        .unwrap();
        assert_ne!(dataset_hash(&base), dataset_hash(&other));

        let config = BacktestConfig::new(OscillatorConfig::Ultimate { days: 3 });
        let a = run_backtest("X", &base, &config).unwrap();
        let b = run_backtest("X", &other, &config).unwrap();
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn run_id_includes_symbol() {
        let series = synthetic_series(200, 9).unwrap();
        let a = run_backtest("AAA", &series, &macd_config()).unwrap();
        let b = run_backtest("BBB", &series, &macd_config()).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert_eq!(a.config_hash, b.config_hash);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn invalid_config_rejected() {
        let series = synthetic_series(50, 1).unwrap();
        let config = BacktestConfig::new(OscillatorConfig::Ultimate { days: 0 });
        assert!(matches!(
            run_backtest("X", &series, &config),
            Err(RunError::Config(ConfigError::Oscillator(_)))
        ));
    }

    #[test]
    fn external_triggers_length_checked() {
        let series = synthetic_series(10, 1).unwrap();
        let conditions = TriggerConditions {
            buy: vec![false; 9],
            sell: vec![false; 9],
        };
        let err = run_with_triggers(
            &series,
            &conditions,
            &PolicyConfig::default(),
            &GainConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Input(InputError::InvalidInput { .. })));
    }
}
