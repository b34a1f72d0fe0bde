//! Input validation errors shared by the series, engine and gain evaluator.

use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Two observations share a timestamp. Never silently deduplicated.
    #[error("duplicate timestamp {timestamp} at position {index}")]
    DuplicateIndex {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("timestamps not strictly increasing at position {index}")]
    Unordered { index: usize },

    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    InvalidInput {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid {field}: {value} (must be finite and >= 0)")]
    InvalidConfig { field: &'static str, value: f64 },
}

impl InputError {
    /// Length check used wherever sequences must be index-aligned.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::InvalidInput {
                what,
                expected,
                actual,
            })
        }
    }
}
