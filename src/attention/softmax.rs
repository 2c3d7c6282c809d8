//! Numerically stable row-wise softmax

/// Logit scale `1 / sqrt(head_dim)` applied to `q·k`
#[inline]
pub fn softmax_scale(head_dim: usize) -> f32 {
    1.0 / (head_dim as f32).sqrt()
}

/// Softmax of one row in place.
///
/// Subtracts the row max before exponentiating. A row whose entries are all
/// `-inf` (fully masked) becomes all zeros instead of NaN.
pub fn softmax_row_in_place(row: &mut [f32]) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        row.fill(0.0);
        return;
    }

    let mut sum = 0.0f32;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }

    let inv_sum = 1.0 / sum;
    for x in row.iter_mut() {
        *x *= inv_sum;
    }
}

/// Row-wise softmax over a `[rows, cols]` buffer
pub fn softmax_in_place(data: &mut [f32], rows: usize, cols: usize) {
    debug_assert_eq!(data.len(), rows * cols);
    if cols == 0 {
        return;
    }
    for row in data.chunks_exact_mut(cols) {
        softmax_row_in_place(row);
    }
}
