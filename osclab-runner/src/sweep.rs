//! Parameter and instrument sweeps.
//!
//! Every run owns its inputs and produces its own result, so runs execute in
//! parallel with Rayon and no locking. Cancellation is coarse: a
//! `CancelToken` is checked before each run starts; a run in flight always
//! finishes. The first failed run stops new runs from starting the same way.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use osclab_core::{GainConfig, PolicyConfig, PriceSeries};

use crate::config::{BacktestConfig, OscillatorConfig};
use crate::runner::{run_backtest, BacktestResult, RunError};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("run for {symbol} failed (config {}): {source}", .config.config_hash())]
    Run {
        symbol: String,
        config: Box<BacktestConfig>,
        #[source]
        source: RunError,
    },
    #[error("sweep cancelled after {completed} of {total} runs")]
    Cancelled { completed: usize, total: usize },
}

/// Shared flag for stopping a sweep between runs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parameter grid over oscillators and policy knobs.
///
/// Expands to the cartesian product of all axes; `costs` is shared.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub oscillators: Vec<OscillatorConfig>,
    pub min_gains: Vec<f64>,
    pub stop_losses: Vec<f64>,
    pub first_opportunity: Vec<bool>,
    pub costs: GainConfig,
}

impl ParamGrid {
    /// Default gating grid around a single oscillator.
    ///
    /// min_gain: 0, 1%, 2%, 5%. stop_loss: off, 2%, 5%. Both first-opportunity modes.
    pub fn gating_default(oscillator: OscillatorConfig) -> Self {
        Self {
            oscillators: vec![oscillator],
            min_gains: vec![0.0, 0.01, 0.02, 0.05],
            stop_losses: vec![0.0, 0.02, 0.05],
            first_opportunity: vec![false, true],
            costs: GainConfig::default(),
        }
    }

    pub fn size(&self) -> usize {
        self.oscillators.len()
            * self.min_gains.len()
            * self.stop_losses.len()
            * self.first_opportunity.len()
    }

    pub fn generate_configs(&self) -> Vec<BacktestConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &oscillator in &self.oscillators {
            for &min_gain in &self.min_gains {
                for &stop_loss in &self.stop_losses {
                    for &first_opportunity in &self.first_opportunity {
                        configs.push(BacktestConfig {
                            oscillator,
                            policy: PolicyConfig {
                                min_gain,
                                stop_loss,
                                first_opportunity,
                            },
                            costs: self.costs,
                        });
                    }
                }
            }
        }
        configs
    }
}

/// Parameter sweep executor.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self {
            parallel: true,
            cancel: None,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run every grid configuration on one series.
    pub fn sweep(
        &self,
        symbol: &str,
        series: &PriceSeries,
        grid: &ParamGrid,
    ) -> Result<SweepResults, SweepError> {
        self.sweep_with_progress(symbol, series, grid, |_, _, _| {})
    }

    /// Like `sweep`, invoking `progress(completed, total, result)` after each run.
    pub fn sweep_with_progress<F>(
        &self,
        symbol: &str,
        series: &PriceSeries,
        grid: &ParamGrid,
        progress: F,
    ) -> Result<SweepResults, SweepError>
    where
        F: Fn(usize, usize, &BacktestResult) + Send + Sync,
    {
        let configs = grid.generate_configs();
        info!(%symbol, runs = configs.len(), parallel = self.parallel, "parameter sweep start");
        let results = self.execute(
            &configs,
            |config| {
                run_backtest(symbol, series, config).map_err(|source| SweepError::Run {
                    symbol: symbol.to_string(),
                    config: Box::new(config.clone()),
                    source,
                })
            },
            progress,
        )?;
        info!(%symbol, runs = results.len(), "parameter sweep complete");
        Ok(SweepResults::new(results))
    }

    /// Run one configuration across many named instruments.
    pub fn sweep_instruments(
        &self,
        instruments: &[(String, PriceSeries)],
        config: &BacktestConfig,
    ) -> Result<SweepResults, SweepError> {
        info!(instruments = instruments.len(), "instrument sweep start");
        let results = self.execute(
            instruments,
            |(symbol, series)| {
                run_backtest(symbol, series, config).map_err(|source| SweepError::Run {
                    symbol: symbol.clone(),
                    config: Box::new(config.clone()),
                    source,
                })
            },
            |_, _, _| {},
        )?;
        info!(runs = results.len(), "instrument sweep complete");
        Ok(SweepResults::new(results))
    }

    fn execute<J, R, F>(
        &self,
        jobs: &[J],
        run: R,
        progress: F,
    ) -> Result<Vec<BacktestResult>, SweepError>
    where
        J: Sync,
        R: Fn(&J) -> Result<BacktestResult, SweepError> + Send + Sync,
        F: Fn(usize, usize, &BacktestResult) + Send + Sync,
    {
        let total = jobs.len();
        let completed = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);

        // None marks a job skipped after cancellation or an earlier failure.
        let job = |j: &J| -> Option<Result<BacktestResult, SweepError>> {
            if failed.load(Ordering::SeqCst)
                || self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            {
                return None;
            }
            let outcome = run(j);
            match &outcome {
                Ok(result) => {
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(done, total, result);
                }
                Err(_) => failed.store(true, Ordering::SeqCst),
            }
            Some(outcome)
        };

        let outcomes: Vec<Option<Result<BacktestResult, SweepError>>> = if self.parallel {
            jobs.par_iter().map(job).collect()
        } else {
            jobs.iter().map(job).collect()
        };

        let mut results = Vec::with_capacity(total);
        let mut skipped = false;
        for outcome in outcomes {
            match outcome {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) => return Err(e),
                None => skipped = true,
            }
        }
        if skipped {
            let completed = completed.load(Ordering::SeqCst);
            warn!(completed, total, "sweep cancelled");
            return Err(SweepError::Cancelled { completed, total });
        }
        Ok(results)
    }
}

/// Results from a sweep, in job order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { results, by_run_id }
    }

    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results by outperformance, best first. NaN sorts last.
    pub fn ranked(&self) -> Vec<&BacktestResult> {
        let mut ranked: Vec<&BacktestResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| {
            let (x, y) = (a.outperformance(), b.outperformance());
            match (x.is_nan(), y.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => y.total_cmp(&x),
            }
        });
        ranked
    }

    pub fn best(&self) -> Option<&BacktestResult> {
        self.ranked().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_series;

    fn grid() -> ParamGrid {
        ParamGrid::gating_default(OscillatorConfig::Macd { short: 5, long: 20 })
    }

    #[test]
    fn grid_size_matches_generated() {
        let g = grid();
        assert_eq!(g.size(), 24);
        assert_eq!(g.generate_configs().len(), 24);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let series = synthetic_series(600, 3).unwrap();
        let par = ParamSweep::new().sweep("S", &series, &grid()).unwrap();
        let seq = ParamSweep::new()
            .with_parallelism(false)
            .sweep("S", &series, &grid())
            .unwrap();
        assert_eq!(par.all(), seq.all());
        assert_eq!(par.len(), 24);
    }

    #[test]
    fn results_indexed_by_run_id() {
        let series = synthetic_series(300, 3).unwrap();
        let results = ParamSweep::new().sweep("S", &series, &grid()).unwrap();
        for r in results.all() {
            assert_eq!(results.get(&r.run_id).unwrap().config, r.config);
        }
        assert!(results.get("missing").is_none());
    }

    #[test]
    fn ranked_best_first() {
        let series = synthetic_series(600, 5).unwrap();
        let results = ParamSweep::new().sweep("S", &series, &grid()).unwrap();
        let ranked = results.ranked();
        for w in ranked.windows(2) {
            assert!(w[0].outperformance() >= w[1].outperformance());
        }
        assert_eq!(results.best().unwrap().run_id, ranked[0].run_id);
    }

    #[test]
    fn progress_reports_every_run() {
        let series = synthetic_series(300, 3).unwrap();
        let calls = AtomicUsize::new(0);
        ParamSweep::new()
            .sweep_with_progress("S", &series, &grid(), |done, total, _| {
                assert!(done <= total);
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 24);
    }

    #[test]
    fn cancelled_before_start_runs_nothing() {
        let series = synthetic_series(300, 3).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = ParamSweep::new()
            .with_cancel(token)
            .sweep("S", &series, &grid())
            .unwrap_err();
        assert!(matches!(
            err,
            SweepError::Cancelled {
                completed: 0,
                total: 24
            }
        ));
    }

    #[test]
    fn cancel_mid_sweep_stops_between_runs() {
        let series = synthetic_series(300, 3).unwrap();
        let token = CancelToken::new();
        let trigger = token.clone();
        let err = ParamSweep::new()
            .with_parallelism(false)
            .with_cancel(token)
            .sweep_with_progress("S", &series, &grid(), move |done, _, _| {
                if done == 3 {
                    trigger.cancel();
                }
            })
            .unwrap_err();
        assert!(matches!(err, SweepError::Cancelled { completed: 3, .. }));
    }

    #[test]
    fn instrument_sweep_keeps_symbol_order() {
        let instruments: Vec<(String, PriceSeries)> = (0..4)
            .map(|i| (format!("SYM{i}"), synthetic_series(400, i).unwrap()))
            .collect();
        let config = BacktestConfig::new(OscillatorConfig::Ultimate { days: 7 });
        let results = ParamSweep::new()
            .sweep_instruments(&instruments, &config)
            .unwrap();
        let symbols: Vec<&str> = results.all().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SYM0", "SYM1", "SYM2", "SYM3"]);
    }

    fn grid_with_bad_macd() -> ParamGrid {
        ParamGrid {
            oscillators: vec![
                OscillatorConfig::Macd { short: 5, long: 20 },
                OscillatorConfig::Macd { short: 9, long: 3 },
                OscillatorConfig::Ultimate { days: 7 },
            ],
            min_gains: vec![0.0],
            stop_losses: vec![0.0],
            first_opportunity: vec![false],
            costs: GainConfig::default(),
        }
    }

    #[test]
    fn failing_run_reports_its_config() {
        let series = synthetic_series(300, 3).unwrap();
        let err = ParamSweep::new()
            .sweep("S", &series, &grid_with_bad_macd())
            .unwrap_err();
        match err {
            SweepError::Run { symbol, config, .. } => {
                assert_eq!(symbol, "S");
                assert_eq!(config.oscillator, OscillatorConfig::Macd { short: 9, long: 3 });
            }
            other => panic!("expected run error, got {other:?}"),
        }
    }

    #[test]
    fn failure_stops_remaining_runs() {
        let series = synthetic_series(300, 3).unwrap();
        let mut grid = grid_with_bad_macd();
        grid.oscillators.swap(0, 1);
        let calls = AtomicUsize::new(0);
        let err = ParamSweep::new()
            .with_parallelism(false)
            .sweep_with_progress("S", &series, &grid, |_, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap_err();
        assert!(matches!(err, SweepError::Run { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identical_data_on_two_symbols_kept_apart() {
        let series = synthetic_series(300, 8).unwrap();
        let instruments = vec![("AAA".to_string(), series.clone()), ("BBB".to_string(), series)];
        let config = BacktestConfig::new(OscillatorConfig::Ultimate { days: 7 });
        let results = ParamSweep::new()
            .sweep_instruments(&instruments, &config)
            .unwrap();
        for r in results.all() {
            assert_eq!(results.get(&r.run_id).unwrap().symbol, r.symbol);
        }
    }

    #[test]
    fn failing_run_reports_symbol() {
        let instruments = vec![("BAD".to_string(), synthetic_series(50, 1).unwrap())];
        let config = BacktestConfig::new(OscillatorConfig::Macd { short: 9, long: 3 });
        let err = ParamSweep::new()
            .sweep_instruments(&instruments, &config)
            .unwrap_err();
        assert!(matches!(err, SweepError::Run { ref symbol, .. } if symbol == "BAD"));
    }
}
