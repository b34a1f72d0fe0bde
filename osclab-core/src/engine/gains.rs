//! Gain evaluator: pairs mask marks into trades and scores them against
//! buy-and-hold.
//!
//! Pure function: prices + action mask → `GainReport`. Consecutive marks
//! pair up as (open, close) in emission order; an odd trailing mark is an
//! unmatched open and is left out of the trade list.

use serde::{Deserialize, Serialize};

use crate::domain::position::gain_between;
use crate::domain::{ActionMask, InputError, TradeRecord};

use super::config::GainConfig;

/// Per-trade and aggregate performance of one action mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainReport {
    pub trades: Vec<TradeRecord>,
    /// Net fractional return of each trade, same order as `trades`.
    #[serde(with = "crate::domain::float_serde::vec")]
    pub per_trade_returns: Vec<f64>,
    /// Sum of `per_trade_returns`.
    #[serde(with = "crate::domain::float_serde")]
    pub total_return: f64,
    /// `price[last] / price[first] - 1`.
    #[serde(with = "crate::domain::float_serde")]
    pub buy_and_hold_return: f64,
    /// `(total_return - buy_and_hold_return) * budget`.
    #[serde(with = "crate::domain::float_serde")]
    pub aggregate_outperformance: f64,
    /// Index of an open mark never closed, if any.
    pub unmatched_open: Option<usize>,
}

impl GainReport {
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Fraction of trades with positive net return. 0.0 with no trades.
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        let wins = self.trades.iter().filter(|t| t.is_winner()).count();
        wins as f64 / self.trades.len() as f64
    }

    pub fn best_trade(&self) -> Option<&TradeRecord> {
        self.trades
            .iter()
            .filter(|t| !t.net_return.is_nan())
            .max_by(|a, b| a.net_return.total_cmp(&b.net_return))
    }

    pub fn worst_trade(&self) -> Option<&TradeRecord> {
        self.trades
            .iter()
            .filter(|t| !t.net_return.is_nan())
            .min_by(|a, b| a.net_return.total_cmp(&b.net_return))
    }
}

/// Passive return over the whole series. 0.0 for fewer than two prices.
pub fn buy_and_hold_return(prices: &[f64]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Score an action mask against the prices it was produced from.
pub fn evaluate_gains(
    prices: &[f64],
    mask: &ActionMask,
    config: &GainConfig,
) -> Result<GainReport, InputError> {
    InputError::check_len("action mask", prices.len(), mask.len())?;
    config.validate()?;

    let round_trip_cost = 2.0 * config.commission;
    let mut trades = Vec::new();
    let mut open: Option<usize> = None;

    for index in mask.marks() {
        match open.take() {
            None => open = Some(index),
            Some(entry_index) => {
                let entry_price = prices[entry_index];
                let exit_price = prices[index];
                trades.push(TradeRecord {
                    entry_index,
                    entry_price,
                    exit_index: index,
                    exit_price,
                    net_return: gain_between(entry_price, exit_price) - round_trip_cost,
                });
            }
        }
    }

    let per_trade_returns: Vec<f64> = trades.iter().map(|t| t.net_return).collect();
    let total_return: f64 = per_trade_returns.iter().sum();
    let buy_and_hold = buy_and_hold_return(prices);

    Ok(GainReport {
        trades,
        per_trade_returns,
        total_return,
        buy_and_hold_return: buy_and_hold,
        aggregate_outperformance: (total_return - buy_and_hold) * config.budget,
        unmatched_open: open,
    })
}
