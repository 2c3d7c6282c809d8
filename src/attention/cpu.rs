//! Reference (quadratic) attention kernel
//!
//! Materializes the full `[seq_len, seq_len]` score matrix. Used as the
//! correctness oracle for the other kernels and as the short-sequence path.

use crate::attention::{mask, softmax, AttentionError, AttentionResult};
use crate::tensor::matmul::{matmul_into, matmul_transposed_scaled};
use crate::tensor::MatrixView;

/// Check one head's Q/K/V views against each other and the output slice
pub(crate) fn check_head_inputs(
    q: MatrixView<'_>,
    k: MatrixView<'_>,
    v: MatrixView<'_>,
    out_len: usize,
) -> AttentionResult<(usize, usize)> {
    let (seq_len, head_dim) = (q.rows(), q.cols());
    if seq_len == 0 || head_dim == 0 {
        return Err(AttentionError::InvalidShape(format!(
            "head must be non-empty, got [{}, {}]",
            seq_len, head_dim
        )));
    }
    if k.rows() != seq_len || k.cols() != head_dim {
        return Err(AttentionError::InvalidShape(format!(
            "key is [{}, {}], query is [{}, {}]",
            k.rows(),
            k.cols(),
            seq_len,
            head_dim
        )));
    }
    if v.rows() != seq_len || v.cols() != head_dim {
        return Err(AttentionError::InvalidShape(format!(
            "value is [{}, {}], query is [{}, {}]",
            v.rows(),
            v.cols(),
            seq_len,
            head_dim
        )));
    }
    if out_len != seq_len * head_dim {
        return Err(AttentionError::InvalidShape(format!(
            "output slice has {} elements, expected {}",
            out_len,
            seq_len * head_dim
        )));
    }
    Ok((seq_len, head_dim))
}

/// `softmax(Q·Kᵀ / sqrt(d)) · V` for one head
///
/// When `weights` is given it receives the `[seq_len, seq_len]` attention
/// weights after softmax.
pub fn reference_attention_head(
    q: MatrixView<'_>,
    k: MatrixView<'_>,
    v: MatrixView<'_>,
    causal: bool,
    out: &mut [f32],
    weights: Option<&mut [f32]>,
) -> AttentionResult<()> {
    let (seq_len, head_dim) = check_head_inputs(q, k, v, out.len())?;
    if let Some(w) = weights.as_deref() {
        if w.len() != seq_len * seq_len {
            return Err(AttentionError::InvalidShape(format!(
                "weights slice has {} elements, expected {}",
                w.len(),
                seq_len * seq_len
            )));
        }
    }

    let scale = softmax::softmax_scale(head_dim);

    // Compute QK^T * scale
    let mut scores = vec![0.0f32; seq_len * seq_len];
    matmul_transposed_scaled(q, k, scale, &mut scores)?;

    if causal {
        mask::apply_causal_mask(&mut scores, seq_len, seq_len, 0, 0);
    }

    softmax::softmax_in_place(&mut scores, seq_len, seq_len);

    matmul_into(&scores, seq_len, v, out)?;

    if let Some(w) = weights {
        w.copy_from_slice(&scores);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(data: &[f32], rows: usize, cols: usize) -> MatrixView<'_> {
        MatrixView::new(data, rows, cols)
    }

    #[test]
    fn test_single_token_returns_value() {
        let q = [0.3, -1.2];
        let k = [2.0, 0.5];
        let v = [7.0, -3.0];
        let mut out = [0.0; 2];
        reference_attention_head(view(&q, 1, 2), view(&k, 1, 2), view(&v, 1, 2), false, &mut out, None)
            .unwrap();
        assert_eq!(out, v);
    }

    #[test]
    fn test_uniform_scores_average_values() {
        // identical keys -> uniform weights -> mean of V
        let q = [1.0, 0.0, 0.0, 1.0];
        let k = [1.0, 1.0, 1.0, 1.0];
        let v = [2.0, 0.0, 4.0, 2.0];
        let mut out = [0.0; 4];
        let mut weights = [0.0; 4];
        reference_attention_head(
            view(&q, 2, 2),
            view(&k, 2, 2),
            view(&v, 2, 2),
            false,
            &mut out,
            Some(&mut weights),
        )
        .unwrap();
        for w in weights {
            assert!((w - 0.5).abs() < 1e-6);
        }
        assert!((out[0] - 3.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_logits_scaled_by_inverse_sqrt_head_dim() {
        // d = 4: q·k0 = 2 -> logit 1, q·k1 = 0 -> logit 0
        let q = [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0];
        let k = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let v = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let mut out = [0.0; 8];
        let mut weights = [0.0; 4];
        reference_attention_head(
            view(&q, 2, 4),
            view(&k, 2, 4),
            view(&v, 2, 4),
            false,
            &mut out,
            Some(&mut weights),
        )
        .unwrap();

        let e = 1.0f32.exp();
        assert!((weights[0] - e / (1.0 + e)).abs() < 1e-6);
        assert!((weights[1] - 1.0 / (1.0 + e)).abs() < 1e-6);
    }

    #[test]
    fn test_causal_weights_upper_triangle_zero() {
        let data: Vec<f32> = (0..12).map(|i| (i as f32 * 0.37).sin()).collect();
        let mut out = vec![0.0; 12];
        let mut weights = vec![0.0; 16];
        reference_attention_head(
            view(&data, 4, 3),
            view(&data, 4, 3),
            view(&data, 4, 3),
            true,
            &mut out,
            Some(&mut weights),
        )
        .unwrap();

        for i in 0..4 {
            let row = &weights[i * 4..(i + 1) * 4];
            for (j, &w) in row.iter().enumerate() {
                if j > i {
                    assert_eq!(w, 0.0);
                }
            }
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
        // row 0 can only see key 0
        assert!((weights[0] - 1.0).abs() < 1e-6);
        assert_eq!(&out[0..3], &data[0..3]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let q = [0.0; 6];
        let k = [0.0; 4];
        let mut out = [0.0; 6];
        let err = reference_attention_head(view(&q, 3, 2), view(&k, 2, 2), view(&q, 3, 2), false, &mut out, None)
            .unwrap_err();
        assert!(matches!(err, AttentionError::InvalidShape(_)));
        assert_eq!(out, [0.0; 6]);
    }

    #[test]
    fn test_weights_buffer_size_checked() {
        let q = [0.0; 4];
        let mut out = [0.0; 4];
        let mut weights = [0.0; 3];
        let err = reference_attention_head(
            view(&q, 2, 2),
            view(&q, 2, 2),
            view(&q, 2, 2),
            false,
            &mut out,
            Some(&mut weights),
        )
        .unwrap_err();
        assert!(matches!(err, AttentionError::InvalidShape(_)));
    }
}
