//! Numeric comparison of kernel outputs

use crate::attention::{AttentionError, AttentionResult};

/// Largest absolute element-wise difference (`‖a − b‖∞`)
///
/// NaN in either input makes the result NaN.
pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).fold(0.0f32, |acc, (x, y)| {
        let d = (x - y).abs();
        if d.is_nan() || acc.is_nan() {
            f32::NAN
        } else {
            acc.max(d)
        }
    })
}

/// Mean absolute element-wise difference
pub fn mean_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs() as f64).sum();
    (sum / n as f64) as f32
}

/// Summary of how far two outputs are apart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonReport {
    pub max_abs_diff: f32,
    pub mean_abs_diff: f32,
    pub tolerance: f32,
    pub within_tolerance: bool,
}

/// Compare two equal-length buffers against `tolerance` (on the max difference)
pub fn compare_outputs(a: &[f32], b: &[f32], tolerance: f32) -> AttentionResult<ComparisonReport> {
    if a.len() != b.len() {
        return Err(AttentionError::InvalidShape(format!(
            "cannot compare buffers of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    let max = max_abs_diff(a, b);
    Ok(ComparisonReport {
        max_abs_diff: max,
        mean_abs_diff: mean_abs_diff(a, b),
        tolerance,
        within_tolerance: max < tolerance,
    })
}
