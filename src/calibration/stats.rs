//! Small descriptive statistics shared by aggregation, fitting and limits

use crate::constants::outliers::TRIM_FRACTION;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len().max(1) as f64
}

/// Population standard deviation; 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let squares: Vec<f64> = values.iter().map(|v| (v - m) * (v - m)).collect();
    mean(&squares).sqrt()
}

/// Median, averaging the two middle values for even counts; 0 when empty
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Mean after dropping ⌊0.1·n⌋ values from each tail
///
/// Falls back to the plain mean if trimming would leave nothing.
pub fn trimmed_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let k = (TRIM_FRACTION * sorted.len() as f64).floor() as usize;
    let kept = if 2 * k < sorted.len() {
        &sorted[k..sorted.len() - k]
    } else {
        &sorted[..]
    };
    mean(kept)
}

/// Ascending copy; NaNs sort last
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}
