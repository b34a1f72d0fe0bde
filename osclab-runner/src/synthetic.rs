//! Deterministic synthetic price series for demos, tests and benchmarks.
//!
//! Geometric random walk on minute bars with a high/low envelope around
//! each close. Same `(n, seed)` → same series, on every platform.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use osclab_core::{Bar, InputError, PriceSeries};

/// Starting close of every synthetic series.
pub const START_PRICE: f64 = 100.0;

/// Per-bar return drawn uniformly from ±`MAX_STEP`.
const MAX_STEP: f64 = 0.01;

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub fn synthetic_bars(n: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = epoch();
    let mut close = START_PRICE;

    (0..n)
        .map(|i| {
            if i > 0 {
                close *= 1.0 + rng.gen_range(-MAX_STEP..MAX_STEP);
            }
            let up = rng.gen_range(0.0..MAX_STEP / 2.0);
            let down = rng.gen_range(0.0..MAX_STEP / 2.0);
            Bar {
                timestamp: base + Duration::minutes(i as i64),
                close,
                high: close * (1.0 + up),
                low: close * (1.0 - down),
            }
        })
        .collect()
}

pub fn synthetic_series(n: usize, seed: u64) -> Result<PriceSeries, InputError> {
    PriceSeries::from_bars(&synthetic_bars(n, seed))
}
