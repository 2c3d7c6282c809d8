//! Causal mask tests
//!
//! Tile-local masking must agree with the full `[seq_len, seq_len]` mask for
//! every tile position, and the reference kernel must produce row-stochastic
//! lower-triangular weights.

use crate::attention::cpu::reference_attention_head;
use crate::attention::mask::{apply_causal_mask, block_fully_masked, block_needs_mask, is_masked};
use crate::tensor::MatrixView;

#[test]
fn test_tile_masks_agree_with_full_mask() {
    let seq_len = 11;
    for bs in [1, 3, 4, 11] {
        for q_start in (0..seq_len).step_by(bs) {
            let q_end = (q_start + bs).min(seq_len);
            for kv_start in (0..seq_len).step_by(bs) {
                let kv_end = (kv_start + bs).min(seq_len);
                let (q_rows, kv_rows) = (q_end - q_start, kv_end - kv_start);

                let mut tile = vec![0.0f32; q_rows * kv_rows];
                apply_causal_mask(&mut tile, q_rows, kv_rows, q_start, kv_start);

                let mut any_masked = false;
                let mut all_masked = true;
                for qi in 0..q_rows {
                    for kj in 0..kv_rows {
                        let masked = tile[qi * kv_rows + kj] == f32::NEG_INFINITY;
                        assert_eq!(masked, is_masked(true, q_start + qi, kv_start + kj));
                        any_masked |= masked;
                        all_masked &= masked;
                    }
                }
                assert_eq!(any_masked, block_needs_mask(true, q_start, kv_end));
                assert_eq!(all_masked, block_fully_masked(true, q_end, kv_start));
            }
        }
    }
}

#[test]
fn test_mask_leaves_visible_scores_untouched() {
    let mut tile: Vec<f32> = (0..6).map(|i| i as f32).collect();
    // rows 2,3 against keys 2,3,4
    apply_causal_mask(&mut tile, 2, 3, 2, 2);
    assert_eq!(
        tile,
        vec![0.0, f32::NEG_INFINITY, f32::NEG_INFINITY, 3.0, 4.0, f32::NEG_INFINITY]
    );
}

#[test]
fn test_reference_causal_weights_row_stochastic() {
    let (seq_len, head_dim) = (16, 4);
    let data: Vec<f32> = (0..seq_len * head_dim)
        .map(|i| ((i * 7 % 13) as f32 - 6.0) * 0.3)
        .collect();
    let view = MatrixView::new(&data, seq_len, head_dim);
    let mut out = vec![0.0; seq_len * head_dim];
    let mut weights = vec![0.0; seq_len * seq_len];

    reference_attention_head(view, view, view, true, &mut out, Some(&mut weights)).unwrap();

    for (i, row) in weights.chunks(seq_len).enumerate() {
        let sum: f32 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "row {} sums to {}", i, sum);
        assert!(row[i + 1..].iter().all(|&w| w == 0.0));
        assert!(row[..=i].iter().all(|&w| w > 0.0));
    }
}
