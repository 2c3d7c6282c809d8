//! Causal behaviour of the tiled kernel
//!
//! Row `i` must only depend on key/value rows `0..=i`.

use crate::attention::flash_attention::flash_attention_head;
use crate::tensor::MatrixView;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_vec(rng: &mut ChaCha8Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-2.0f32..2.0)).collect()
}

fn tiled(q: &[f32], k: &[f32], v: &[f32], seq_len: usize, head_dim: usize, block_size: usize) -> Vec<f32> {
    let mut out = vec![0.0; seq_len * head_dim];
    flash_attention_head(
        MatrixView::new(q, seq_len, head_dim),
        MatrixView::new(k, seq_len, head_dim),
        MatrixView::new(v, seq_len, head_dim),
        true,
        block_size,
        &mut out,
    )
    .unwrap();
    out
}

#[test]
fn test_rows_invariant_to_future_keys_and_values() {
    let (seq_len, head_dim) = (37, 8);
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let q = random_vec(&mut rng, seq_len * head_dim);
    let k = random_vec(&mut rng, seq_len * head_dim);
    let v = random_vec(&mut rng, seq_len * head_dim);

    for block_size in [1, 5, 16, 64] {
        let baseline = tiled(&q, &k, &v, seq_len, head_dim, block_size);

        for cut in [0, 4, 15, 16, 36] {
            // Scramble every K/V row after `cut`
            let mut k2 = k.clone();
            let mut v2 = v.clone();
            for x in k2[(cut + 1) * head_dim..].iter_mut() {
                *x = rng.gen_range(-50.0f32..50.0);
            }
            for x in v2[(cut + 1) * head_dim..].iter_mut() {
                *x = rng.gen_range(-50.0f32..50.0);
            }

            let perturbed = tiled(&q, &k2, &v2, seq_len, head_dim, block_size);
            let prefix = (cut + 1) * head_dim;
            assert_eq!(
                &baseline[..prefix],
                &perturbed[..prefix],
                "block_size={} cut={}",
                block_size,
                cut
            );
        }
    }
}

#[test]
fn test_first_row_is_first_value() {
    let (seq_len, head_dim) = (10, 4);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let q = random_vec(&mut rng, seq_len * head_dim);
    let k = random_vec(&mut rng, seq_len * head_dim);
    let v = random_vec(&mut rng, seq_len * head_dim);

    for block_size in [1, 3, 10, 32] {
        let out = tiled(&q, &k, &v, seq_len, head_dim, block_size);
        assert_eq!(&out[..head_dim], &v[..head_dim]);
    }
}

#[test]
fn test_concrete_four_by_two_causal() {
    // Q = K, block size 2
    let q = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0];
    let v = [1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0];
    let out = tiled(&q, &q, &v, 4, 2, 2);

    // row 0 sees only key 0
    assert_eq!(&out[0..2], &[1.0, 0.0]);

    // row 1: scores [0, 1/sqrt2] over keys 0,1
    let s = 1.0f32 / 2.0f32.sqrt();
    let w1 = 1.0 / (1.0 + s.exp());
    assert!((out[2] - w1).abs() < 1e-6);
    assert!((out[3] - (1.0 - w1)).abs() < 1e-6);

    // row 3: q = 0 -> uniform over keys 0..=3 -> mean of V
    assert!((out[6] - 1.0).abs() < 1e-6);
    assert!((out[7] - 0.75).abs() < 1e-6);
}
