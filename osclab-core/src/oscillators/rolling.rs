//! Rolling window helpers with NaN propagation.
//!
//! A window containing any NaN yields NaN; the first `period - 1` outputs
//! are NaN. Both run in O(n).

pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &entering) in values.iter().enumerate() {
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum;
        }
    }
    result
}

pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let mut sums = rolling_sum(values, period);
    for v in &mut sums {
        *v /= period as f64;
    }
    sums
}

/// Element-wise minimum that propagates NaN (`f64::min` ignores it).
pub fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Element-wise maximum that propagates NaN.
pub fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}
