//! Policy cycle: turns buy/sell edges into an alternating open/close mask.
//!
//! One left-to-right pass over the bars with O(1) state: the current
//! `Position` and a flag for a pending first-opportunity close. Per bar at
//! most one action executes:
//!
//! - Flat: a buy edge opens at the bar's price. Sell edges are ignored.
//! - Long: buy edges are ignored. Stop-loss is checked first on every bar
//!   after entry; then a sell edge closes if the gain gate allows it; then a
//!   pending first-opportunity close fires once the gain target is met.
//!
//! A position still open at series end stays open.
//!
//! Non-finite gains (NaN prices, zero entry price) never satisfy the gain
//! target or the stop-loss.

use serde::{Deserialize, Serialize};

use crate::domain::position::gain_between;
use crate::domain::{ActionMask, InputError, Position};

use super::config::PolicyConfig;
use super::edges::TriggerEdges;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Eligible sell edge.
    SellEdge,
    /// First bar meeting `min_gain` after an ineligible sell edge.
    FirstOpportunity,
    /// Drawdown reached `stop_loss`.
    StopLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Open,
    Close(CloseReason),
}

/// One executed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleAction {
    pub index: usize,
    pub kind: ActionKind,
}

impl CycleAction {
    pub fn is_open(&self) -> bool {
        self.kind == ActionKind::Open
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        match self.kind {
            ActionKind::Open => None,
            ActionKind::Close(reason) => Some(reason),
        }
    }
}

/// Mask plus the ordered actions behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleTrace {
    pub mask: ActionMask,
    pub actions: Vec<CycleAction>,
    /// State after the last bar; `Long` means an unmatched trailing open.
    pub final_position: Position,
}

/// Run the policy cycle and return only the action mask.
pub fn run_policy_cycle(
    prices: &[f64],
    edges: &TriggerEdges,
    config: &PolicyConfig,
) -> Result<ActionMask, InputError> {
    check_inputs(prices, edges, config)?;
    let mut mask = ActionMask::flat(prices.len());
    scan(prices, &edges.buy, &edges.sell, config, |action| {
        mask.mark(action.index)
    });
    Ok(mask)
}

/// Run the policy cycle and keep every action with its close reason.
pub fn trace_policy_cycle(
    prices: &[f64],
    edges: &TriggerEdges,
    config: &PolicyConfig,
) -> Result<CycleTrace, InputError> {
    check_inputs(prices, edges, config)?;
    let mut mask = ActionMask::flat(prices.len());
    let mut actions = Vec::new();
    let final_position = scan(prices, &edges.buy, &edges.sell, config, |action| {
        mask.mark(action.index);
        actions.push(action);
    });
    tracing::debug!(
        bars = prices.len(),
        actions = actions.len(),
        open_at_end = final_position.is_long(),
        "policy cycle complete"
    );
    Ok(CycleTrace {
        mask,
        actions,
        final_position,
    })
}

fn check_inputs(prices: &[f64], edges: &TriggerEdges, config: &PolicyConfig) -> Result<(), InputError> {
    InputError::check_len("buy edges", prices.len(), edges.buy.len())?;
    InputError::check_len("sell edges", prices.len(), edges.sell.len())?;
    config.validate()
}

#[inline]
fn meets_target(gain: f64, min_gain: f64) -> bool {
    gain.is_finite() && gain >= min_gain
}

#[inline]
fn hits_stop(gain: f64, stop_loss: f64) -> bool {
    gain.is_finite() && gain <= -stop_loss
}

/// The single scan behind both entry points. Lengths are already checked.
fn scan<F>(prices: &[f64], buy: &[bool], sell: &[bool], config: &PolicyConfig, mut emit: F) -> Position
where
    F: FnMut(CycleAction),
{
    let mut position = Position::Flat;
    // Armed by an ineligible sell edge when first_opportunity is set.
    let mut pending = false;

    for (i, &price) in prices.iter().enumerate() {
        match position {
            Position::Flat => {
                if buy[i] {
                    position = Position::Long {
                        entry_index: i,
                        entry_price: price,
                    };
                    pending = false;
                    emit(CycleAction {
                        index: i,
                        kind: ActionKind::Open,
                    });
                }
            }
            Position::Long { entry_price, .. } => {
                let gain = gain_between(entry_price, price);

                let reason = if config.stop_loss > 0.0 && hits_stop(gain, config.stop_loss) {
                    Some(CloseReason::StopLoss)
                } else if sell[i] && (config.min_gain == 0.0 || meets_target(gain, config.min_gain)) {
                    Some(CloseReason::SellEdge)
                } else if pending && meets_target(gain, config.min_gain) {
                    Some(CloseReason::FirstOpportunity)
                } else {
                    if sell[i] && config.first_opportunity {
                        pending = true;
                    }
                    None
                };

                if let Some(reason) = reason {
                    position = Position::Flat;
                    pending = false;
                    emit(CycleAction {
                        index: i,
                        kind: ActionKind::Close(reason),
                    });
                }
            }
        }
    }

    position
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: [f64; 5] = [100.0, 105.0, 90.0, 110.0, 95.0];

    fn edges_at(n: usize, buys: &[usize], sells: &[usize]) -> TriggerEdges {
        let mut edges = TriggerEdges {
            buy: vec![false; n],
            sell: vec![false; n],
        };
        for &i in buys {
            edges.buy[i] = true;
        }
        for &i in sells {
            edges.sell[i] = true;
        }
        edges
    }

    fn config(min_gain: f64, stop_loss: f64, first_opportunity: bool) -> PolicyConfig {
        PolicyConfig::new(min_gain, stop_loss, first_opportunity).unwrap()
    }

    #[test]
    fn plain_alternation_closes_at_first_sell_edge() {
        let edges = edges_at(5, &[1], &[2, 4]);
        let mask = run_policy_cycle(&PRICES, &edges, &PolicyConfig::default()).unwrap();
        assert_eq!(mask.as_slice(), &[false, true, true, false, false]);
    }

    #[test]
    fn sell_edges_ignored_while_flat_and_buy_edges_while_long() {
        let edges = edges_at(5, &[1, 3], &[0, 4]);
        let trace = trace_policy_cycle(&PRICES, &edges, &PolicyConfig::default()).unwrap();
        assert_eq!(trace.mask.as_slice(), &[false, true, false, false, true]);
        assert_eq!(trace.final_position, Position::Flat);
    }

    #[test]
    fn first_opportunity_without_qualifying_bar_stays_open() {
        let edges = edges_at(5, &[1], &[2, 4]);
        let trace = trace_policy_cycle(&PRICES, &edges, &config(0.10, 0.0, true)).unwrap();
        assert_eq!(trace.mask.as_slice(), &[false, true, false, false, false]);
        assert_eq!(
            trace.final_position,
            Position::Long {
                entry_index: 1,
                entry_price: 105.0
            }
        );
    }

    #[test]
    fn first_opportunity_closes_between_edges() {
        let prices = [100.0, 100.0, 95.0, 104.0, 112.0, 120.0];
        let edges = edges_at(6, &[1], &[2, 5]);
        let trace = trace_policy_cycle(&prices, &edges, &config(0.10, 0.0, true)).unwrap();
        assert_eq!(trace.mask.marks().collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(
            trace.actions[1].close_reason(),
            Some(CloseReason::FirstOpportunity)
        );
    }

    #[test]
    fn without_first_opportunity_waits_for_next_edge() {
        let prices = [100.0, 100.0, 95.0, 104.0, 112.0, 120.0];
        let edges = edges_at(6, &[1], &[2, 5]);
        let trace = trace_policy_cycle(&prices, &edges, &config(0.10, 0.0, false)).unwrap();
        assert_eq!(trace.mask.marks().collect::<Vec<_>>(), vec![1, 5]);
        assert_eq!(trace.actions[1].close_reason(), Some(CloseReason::SellEdge));
    }

    #[test]
    fn ineligible_edge_is_discarded_without_first_opportunity() {
        // Edge at 3 has 4.8% < 10%; later 120 without an edge does not close.
        let prices = [100.0, 105.0, 90.0, 110.0, 120.0];
        let edges = edges_at(5, &[1], &[3]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.10, 0.0, false)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn first_opportunity_does_not_arm_before_any_sell_edge() {
        let prices = [100.0, 150.0, 160.0];
        let edges = edges_at(3, &[0], &[]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.10, 0.0, true)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn first_opportunity_with_zero_min_gain_closes_at_edge() {
        let edges = edges_at(5, &[1], &[2, 4]);
        let mask = run_policy_cycle(&PRICES, &edges, &config(0.0, 0.0, true)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn stop_loss_forces_close_without_sell_edge() {
        let edges = edges_at(5, &[1], &[]);
        let trace = trace_policy_cycle(&PRICES, &edges, &config(0.0, 0.10, false)).unwrap();
        assert_eq!(trace.mask.marks().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(trace.actions[1].close_reason(), Some(CloseReason::StopLoss));
    }

    #[test]
    fn stop_loss_has_priority_over_sell_edge() {
        let edges = edges_at(5, &[1], &[2]);
        let trace = trace_policy_cycle(&PRICES, &edges, &config(0.0, 0.10, false)).unwrap();
        assert_eq!(trace.actions[1].close_reason(), Some(CloseReason::StopLoss));
    }

    #[test]
    fn stop_loss_cancels_pending_first_opportunity() {
        let prices = [100.0, 98.0, 85.0, 130.0];
        let edges = edges_at(4, &[0], &[1]);
        let trace = trace_policy_cycle(&prices, &edges, &config(0.10, 0.10, true)).unwrap();
        assert_eq!(trace.mask.marks().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(trace.actions[1].close_reason(), Some(CloseReason::StopLoss));
    }

    #[test]
    fn stop_loss_not_checked_on_entry_bar() {
        let prices = [100.0, 100.0];
        let edges = edges_at(2, &[0], &[]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.0, 1e-9, false)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn same_bar_buy_and_sell_while_flat_only_opens() {
        let prices = [100.0, 101.0, 102.0];
        let edges = edges_at(3, &[0], &[0, 2]);
        let mask = run_policy_cycle(&prices, &edges, &PolicyConfig::default()).unwrap();
        assert_eq!(mask.as_slice(), &[true, false, true]);
    }

    #[test]
    fn same_bar_buy_and_sell_while_long_closes() {
        let prices = [100.0, 101.0, 102.0];
        let edges = edges_at(3, &[0, 1], &[1]);
        let mask = run_policy_cycle(&prices, &edges, &PolicyConfig::default()).unwrap();
        assert_eq!(mask.as_slice(), &[true, true, false]);
    }

    #[test]
    fn nan_price_never_triggers_stop_loss() {
        let prices = [100.0, f64::NAN, 95.0];
        let edges = edges_at(3, &[0], &[]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.0, 0.01, false)).unwrap();
        // NaN bar skipped; 95 is a 5% drawdown and closes.
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn nan_price_never_meets_min_gain() {
        let prices = [100.0, f64::NAN, 50.0];
        let edges = edges_at(3, &[0], &[1]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.01, 0.0, true)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn nan_entry_price_disables_gated_exits() {
        let prices = [f64::NAN, 200.0, 1.0, 500.0];
        let edges = edges_at(4, &[0], &[1, 3]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.05, 0.05, true)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn zero_entry_price_infinite_gain_is_not_met() {
        let prices = [0.0, 10.0, 20.0];
        let edges = edges_at(3, &[0], &[1]);
        let mask = run_policy_cycle(&prices, &edges, &config(0.5, 0.0, true)).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn ungated_sell_edge_closes_even_at_nan_price() {
        let prices = [100.0, f64::NAN];
        let edges = edges_at(2, &[0], &[1]);
        let mask = run_policy_cycle(&prices, &edges, &PolicyConfig::default()).unwrap();
        assert_eq!(mask.marks().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn length_mismatch_is_invalid_input() {
        let edges = edges_at(4, &[1], &[2]);
        let err = run_policy_cycle(&PRICES, &edges, &PolicyConfig::default()).unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidInput {
                what: "buy edges",
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn invalid_config_rejected_before_scan() {
        let edges = edges_at(5, &[1], &[2]);
        let bad = PolicyConfig {
            min_gain: -1.0,
            stop_loss: 0.0,
            first_opportunity: false,
        };
        assert!(matches!(
            run_policy_cycle(&PRICES, &edges, &bad),
            Err(InputError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn empty_series_gives_empty_mask() {
        let mask = run_policy_cycle(&[], &TriggerEdges::default(), &PolicyConfig::default()).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn mask_and_trace_agree() {
        let prices = [100.0, 99.0, 104.0, 90.0, 120.0, 80.0, 130.0];
        let edges = edges_at(7, &[0, 3, 5], &[1, 2, 4, 6]);
        let c = config(0.03, 0.12, true);
        let mask = run_policy_cycle(&prices, &edges, &c).unwrap();
        let trace = trace_policy_cycle(&prices, &edges, &c).unwrap();
        assert_eq!(mask, trace.mask);
        assert_eq!(
            trace.actions.iter().map(|a| a.index).collect::<Vec<_>>(),
            mask.marks().collect::<Vec<_>>()
        );
    }
}
