//! Tiled attention kernel with online softmax
//!
//! Computes the same result as [`crate::attention::cpu`] without ever holding
//! the `[seq_len, seq_len]` score matrix. Queries and keys are split into
//! blocks of `block_size` rows; for every query block the key/value blocks are
//! visited in increasing order and each row keeps a running max `M`, a running
//! sum `L` (relative to `M`) and an unnormalized accumulator `O`. When a later
//! block raises the max, the old `L` and `O` are rescaled by `exp(M_old - M_new)`.
//!
//! Working memory per head is one `[block_size, block_size]` score tile plus
//! `M`/`L` for one query block. `O` lives directly in the caller's output slice.

use crate::attention::cpu::check_head_inputs;
use crate::attention::{mask, softmax, AttentionError, AttentionResult};
use crate::tensor::matmul::matmul_transposed_scaled;
use crate::tensor::MatrixView;

/// Running softmax statistics for the rows of one query block
#[derive(Debug, Clone)]
pub struct OnlineSoftmaxState {
    /// Running max logit per row
    m: Vec<f32>,
    /// Running sum of `exp(s - m)` per row
    l: Vec<f32>,
}

impl OnlineSoftmaxState {
    pub fn new(capacity: usize) -> Self {
        Self {
            m: Vec::with_capacity(capacity),
            l: Vec::with_capacity(capacity),
        }
    }

    /// Start a fresh query block of `rows` rows
    pub fn reset(&mut self, rows: usize) {
        self.m.clear();
        self.m.resize(rows, f32::NEG_INFINITY);
        self.l.clear();
        self.l.resize(rows, 0.0);
    }

    pub fn rows(&self) -> usize {
        self.m.len()
    }

    pub fn max(&self, row: usize) -> f32 {
        self.m[row]
    }

    pub fn sum(&self, row: usize) -> f32 {
        self.l[row]
    }

    /// Fold one key/value block into `row`.
    ///
    /// `scores` holds the row's scaled logits against the block and is
    /// overwritten with the unnormalized probabilities. `acc` is the row's
    /// accumulator in the output. Masked logits are `-inf` and contribute 0.
    pub fn update(&mut self, row: usize, scores: &mut [f32], acc: &mut [f32], v_block: MatrixView<'_>) {
        debug_assert_eq!(scores.len(), v_block.rows());
        debug_assert_eq!(acc.len(), v_block.cols());

        let block_max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let m_old = self.m[row];
        let m_new = m_old.max(block_max);

        // Every column seen so far is masked: leave the row untouched
        if m_new == f32::NEG_INFINITY {
            return;
        }

        let corr = if m_old == f32::NEG_INFINITY {
            0.0
        } else {
            (m_old - m_new).exp()
        };

        let mut block_sum = 0.0f32;
        for s in scores.iter_mut() {
            *s = (*s - m_new).exp();
            block_sum += *s;
        }

        self.l[row] = self.l[row] * corr + block_sum;

        if corr != 1.0 {
            for o in acc.iter_mut() {
                *o *= corr;
            }
        }
        for (j, &p) in scores.iter().enumerate() {
            if p == 0.0 {
                continue;
            }
            for (o, &v) in acc.iter_mut().zip(v_block.row(j)) {
                *o += p * v;
            }
        }

        self.m[row] = m_new;
    }

    /// Divide the accumulator by `L`; a row that saw no unmasked key becomes zero
    pub fn finalize(&self, row: usize, acc: &mut [f32]) {
        let l = self.l[row];
        if l > 0.0 {
            let inv = 1.0 / l;
            for o in acc.iter_mut() {
                *o *= inv;
            }
        } else {
            acc.fill(0.0);
        }
    }
}

/// Tiled attention for one head
///
/// `block_size` larger than `seq_len` collapses to a single block.
pub fn flash_attention_head(
    q: MatrixView<'_>,
    k: MatrixView<'_>,
    v: MatrixView<'_>,
    causal: bool,
    block_size: usize,
    out: &mut [f32],
) -> AttentionResult<()> {
    if block_size == 0 {
        return Err(AttentionError::InvalidBlockSize(0));
    }
    let (seq_len, head_dim) = check_head_inputs(q, k, v, out.len())?;

    let bs = block_size.min(seq_len);
    let scale = softmax::softmax_scale(head_dim);

    let mut state = OnlineSoftmaxState::new(bs);
    // Score tile, reused for the exponentials of every block pair
    let mut tile = vec![0.0f32; bs * bs];

    out.fill(0.0);

    for (q_start, out_block) in (0..seq_len).step_by(bs).zip(out.chunks_mut(bs * head_dim)) {
        let q_end = (q_start + bs).min(seq_len);
        let q_rows = q_end - q_start;
        let q_block = q.row_range(q_start, q_end);

        state.reset(q_rows);

        for kv_start in (0..seq_len).step_by(bs) {
            // Key blocks only move further into the future from here
            if mask::block_fully_masked(causal, q_end, kv_start) {
                break;
            }
            let kv_end = (kv_start + bs).min(seq_len);
            let kv_rows = kv_end - kv_start;

            let scores = &mut tile[..q_rows * kv_rows];
            matmul_transposed_scaled(q_block, k.row_range(kv_start, kv_end), scale, scores)?;

            if mask::block_needs_mask(causal, q_start, kv_end) {
                mask::apply_causal_mask(scores, q_rows, kv_rows, q_start, kv_start);
            }

            let v_block = v.row_range(kv_start, kv_end);
            for (i, (score_row, acc)) in scores
                .chunks_exact_mut(kv_rows)
                .zip(out_block.chunks_exact_mut(head_dim))
                .enumerate()
            {
                state.update(i, score_row, acc, v_block);
            }
        }

        for (i, acc) in out_block.chunks_exact_mut(head_dim).enumerate() {
            state.finalize(i, acc);
        }
    }

    Ok(())
}
