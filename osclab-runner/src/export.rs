//! Reporting and export: JSON and CSV artifacts.
//!
//! - **JSON**: full `BacktestResult` round-trip with schema versioning
//! - **CSV**: trade ledger of a run, leaderboard of a sweep
//!
//! Unknown (newer) schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade ledger of one run.
///
/// Columns: entry_time, exit_time, entry_index, exit_index, entry_price,
/// exit_price, bars_held, net_return, close_reason
pub fn export_trades_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_time",
        "exit_time",
        "entry_index",
        "exit_index",
        "entry_price",
        "exit_price",
        "bars_held",
        "net_return",
        "close_reason",
    ])?;

    for e in &result.ledger {
        let t = &e.trade;
        wtr.write_record([
            &e.entry_time.to_string(),
            &e.exit_time.to_string(),
            &t.entry_index.to_string(),
            &t.exit_index.to_string(),
            &format!("{:.6}", t.entry_price),
            &format!("{:.6}", t.exit_price),
            &t.bars_held().to_string(),
            &format!("{:.6}", t.net_return),
            &format!("{:?}", e.close_reason),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Sweep leaderboard, best outperformance first.
///
/// Columns: rank, symbol, oscillator, min_gain, stop_loss,
/// first_opportunity, trades, win_rate, total_return, buy_and_hold,
/// outperformance, run_id
pub fn export_leaderboard_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "symbol",
        "oscillator",
        "min_gain",
        "stop_loss",
        "first_opportunity",
        "trades",
        "win_rate",
        "total_return",
        "buy_and_hold",
        "outperformance",
        "run_id",
    ])?;

    for (rank, r) in results.ranked().into_iter().enumerate() {
        let policy = &r.config.policy;
        wtr.write_record([
            &(rank + 1).to_string(),
            &r.symbol,
            &r.oscillator,
            &policy.min_gain.to_string(),
            &policy.stop_loss.to_string(),
            &policy.first_opportunity.to_string(),
            &r.trade_count().to_string(),
            &format!("{:.4}", r.report.win_rate()),
            &format!("{:.6}", r.report.total_return),
            &format!("{:.6}", r.report.buy_and_hold_return),
            &format!("{:.4}", r.outperformance()),
            &r.run_id,
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save `manifest.json` and `trades.csv` under
/// `{output_dir}/{symbol}_{run_id prefix}/` and return that directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)
        .context("failed to write manifest.json")?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(result)?)
        .context("failed to write trades.csv")?;

    Ok(run_dir)
}
