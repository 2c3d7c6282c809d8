//! Shared helpers for attnforge integration tests

#![allow(dead_code)]

mod tempfile_helpers;

pub use tempfile_helpers::{create_temp_dir, temp_config_path};

use attnforge::{AttentionConfig, Tensor};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Q, K and V for one attention call
pub struct Inputs {
    pub query: Tensor,
    pub key: Tensor,
    pub value: Tensor,
}

/// Seeded random Q/K/V in `[-1, 1)` shaped for `config`
pub fn random_inputs(config: &AttentionConfig, seed: u64) -> Inputs {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tensor = || {
        Tensor::from_fn(config.qkv_shape(), |_| rng.gen_range(-1.0f32..1.0)).unwrap()
    };
    Inputs {
        query: tensor(),
        key: tensor(),
        value: tensor(),
    }
}

/// Naive per-head attention over row-major `[seq_len, head_dim]` slices
pub fn naive_attention(q: &[f32], k: &[f32], v: &[f32], seq_len: usize, head_dim: usize, causal: bool) -> Vec<f32> {
    let scale = 1.0 / (head_dim as f64).sqrt();
    let mut out = vec![0.0f32; seq_len * head_dim];
    for i in 0..seq_len {
        let visible = if causal { i + 1 } else { seq_len };
        let scores: Vec<f64> = (0..visible)
            .map(|j| {
                (0..head_dim)
                    .map(|c| q[i * head_dim + c] as f64 * k[j * head_dim + c] as f64)
                    .sum::<f64>()
                    * scale
            })
            .collect();
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        for c in 0..head_dim {
            let acc: f64 = (0..visible).map(|j| exps[j] * v[j * head_dim + c] as f64).sum();
            out[i * head_dim + c] = (acc / sum) as f32;
        }
    }
    out
}
