//! Linear-complexity attention approximation
//!
//! Replaces `exp(q·k)` with `φ(q)·φ(k)` where `φ(x) = elu(x) + 1`, so the
//! key/value contraction can be done once:
//!
//! ```text
//! S = Σ_j φ(k_j)ᵀ v_j      [head_dim, head_dim]
//! z = Σ_j φ(k_j)           [head_dim]
//! out_i = φ(q_i)·S / (φ(q_i)·z)
//! ```
//!
//! The causal variant keeps `S` and `z` as prefix sums over `j <= i`.
//! Results are approximate by construction and never match the exact kernels.

use crate::attention::cpu::check_head_inputs;
use crate::attention::AttentionResult;
use crate::tensor::matmul::dot;
use crate::tensor::MatrixView;

/// `elu(x) + 1`, strictly positive
#[inline]
pub fn feature_map(x: f32) -> f32 {
    if x > 0.0 {
        x + 1.0
    } else {
        x.exp()
    }
}

fn feature_map_into(src: &[f32], dst: &mut [f32]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = feature_map(s);
    }
}

/// Add `φ(k)ᵀ v` to `kv_state` and `φ(k)` to `k_sum`
fn accumulate(phi_k: &[f32], v: &[f32], kv_state: &mut [f32], k_sum: &mut [f32]) {
    let dim_v = v.len();
    for ((row, &pk), ks) in kv_state.chunks_exact_mut(dim_v).zip(phi_k).zip(k_sum.iter_mut()) {
        *ks += pk;
        for (s, &vv) in row.iter_mut().zip(v) {
            *s += pk * vv;
        }
    }
}

/// `φ(q)·S / (φ(q)·z)`, zero when the denominator vanishes
fn readout(phi_q: &[f32], kv_state: &[f32], k_sum: &[f32], out: &mut [f32]) {
    let denom = dot(phi_q, k_sum);
    out.fill(0.0);
    if denom <= 0.0 || !denom.is_finite() {
        return;
    }
    let dim_v = out.len();
    for (row, &pq) in kv_state.chunks_exact(dim_v).zip(phi_q) {
        for (o, &s) in out.iter_mut().zip(row) {
            *o += pq * s;
        }
    }
    let inv = 1.0 / denom;
    for o in out.iter_mut() {
        *o *= inv;
    }
}

/// Linear attention for one head
pub fn linear_attention_head(
    q: MatrixView<'_>,
    k: MatrixView<'_>,
    v: MatrixView<'_>,
    causal: bool,
    out: &mut [f32],
) -> AttentionResult<()> {
    let (seq_len, head_dim) = check_head_inputs(q, k, v, out.len())?;

    let mut kv_state = vec![0.0f32; head_dim * head_dim];
    let mut k_sum = vec![0.0f32; head_dim];
    let mut phi = vec![0.0f32; head_dim];

    if causal {
        for (i, out_row) in out.chunks_exact_mut(head_dim).enumerate() {
            feature_map_into(k.row(i), &mut phi);
            accumulate(&phi, v.row(i), &mut kv_state, &mut k_sum);
            feature_map_into(q.row(i), &mut phi);
            readout(&phi, &kv_state, &k_sum, out_row);
        }
    } else {
        for j in 0..seq_len {
            feature_map_into(k.row(j), &mut phi);
            accumulate(&phi, v.row(j), &mut kv_state, &mut k_sum);
        }
        for (i, out_row) in out.chunks_exact_mut(head_dim).enumerate() {
            feature_map_into(q.row(i), &mut phi);
            readout(&phi, &kv_state, &k_sum, out_row);
        }
    }
    Ok(())
}
