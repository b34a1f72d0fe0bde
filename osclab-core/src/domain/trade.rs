//! TradeRecord: one completed open/close pair from an action mask.

use serde::{Deserialize, Serialize};

use super::position::gain_between;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_index: usize,
    #[serde(with = "crate::domain::float_serde")]
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    #[serde(with = "crate::domain::float_serde")]
    pub exit_price: f64,

    /// Net fractional return: `exit / entry - 1 - 2 * commission`.
    #[serde(with = "crate::domain::float_serde")]
    pub net_return: f64,
}

impl TradeRecord {
    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }

    /// Fractional return before commission.
    pub fn gross_return(&self) -> f64 {
        gain_between(self.entry_price, self.exit_price)
    }

    pub fn is_winner(&self) -> bool {
        self.net_return > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            entry_index: 4,
            entry_price: 100.0,
            exit_index: 9,
            exit_price: 110.0,
            net_return: 0.09,
        }
    }

    #[test]
    fn bars_held_and_gross() {
        let t = sample_trade();
        assert_eq!(t.bars_held(), 5);
        assert!((t.gross_return() - 0.10).abs() < 1e-12);
        assert!(t.is_winner());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }

    #[test]
    fn nan_exit_survives_serialization() {
        let trade = TradeRecord {
            exit_price: f64::NAN,
            net_return: f64::NAN,
            ..sample_trade()
        };
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.entry_price, 100.0);
        assert!(deser.exit_price.is_nan());
        assert!(deser.net_return.is_nan());
    }
}
