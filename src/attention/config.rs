//! Attention call configuration and block-size heuristic

use super::{softmax, AttentionError, AttentionResult};
use crate::tensor::{Tensor, TensorShape};
use serde::{Deserialize, Serialize};

/// Shape and options of one attention call
///
/// Tensors are `[batch_size, num_heads, seq_len, head_dim]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Number of sequences
    pub batch_size: usize,
    /// Number of attention heads
    pub num_heads: usize,
    /// Sequence length
    pub seq_len: usize,
    /// Dimension per head
    pub head_dim: usize,
    /// Whether to use causal masking
    pub is_causal: bool,
    /// Tile size for the tiled kernel; heuristic when `None`
    pub block_size: Option<usize>,
    /// Also return attention weights (reference kernel only)
    pub return_weights: bool,
}

impl AttentionConfig {
    pub fn new(batch_size: usize, num_heads: usize, seq_len: usize, head_dim: usize) -> Self {
        AttentionConfig {
            batch_size,
            num_heads,
            seq_len,
            head_dim,
            is_causal: false,
            block_size: None,
            return_weights: false,
        }
    }

    pub fn with_causal(mut self, is_causal: bool) -> Self {
        self.is_causal = is_causal;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn with_return_weights(mut self, return_weights: bool) -> Self {
        self.return_weights = return_weights;
        self
    }

    /// `1 / sqrt(head_dim)`
    pub fn scale(&self) -> f32 {
        softmax::softmax_scale(self.head_dim)
    }

    /// Number of independent `(batch, head)` units (saturating)
    pub fn num_units(&self) -> usize {
        self.batch_size.saturating_mul(self.num_heads)
    }

    /// Elements in one unit's `[seq_len, head_dim]` slice (saturating)
    pub fn head_stride(&self) -> usize {
        self.seq_len.saturating_mul(self.head_dim)
    }

    /// Expected shape of Q, K, V and the output
    pub fn qkv_shape(&self) -> TensorShape {
        TensorShape::attention(self.batch_size, self.num_heads, self.seq_len, self.head_dim)
    }

    /// Validate dimensions and an explicitly supplied block size
    pub fn validate(&self) -> AttentionResult<()> {
        let dims = [
            ("batch_size", self.batch_size),
            ("num_heads", self.num_heads),
            ("seq_len", self.seq_len),
            ("head_dim", self.head_dim),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(AttentionError::InvalidShape(format!("{} must be > 0", name)));
            }
        }
        if self.qkv_shape().checked_numel().is_none() {
            return Err(AttentionError::InvalidShape(format!(
                "[{}, {}, {}, {}] overflows usize",
                self.batch_size, self.num_heads, self.seq_len, self.head_dim
            )));
        }
        if let Some(0) = self.block_size {
            return Err(AttentionError::InvalidBlockSize(0));
        }
        Ok(())
    }

    /// Check that Q, K and V match the declared shape
    pub fn validate_inputs(&self, query: &Tensor, key: &Tensor, value: &Tensor) -> AttentionResult<()> {
        let expected = self.qkv_shape();
        for (name, tensor) in [("query", query), ("key", key), ("value", value)] {
            if tensor.dims() != expected.dims() {
                return Err(AttentionError::InvalidShape(format!(
                    "{} has shape {:?}, config declares {:?}",
                    name,
                    tensor.dims(),
                    expected.dims()
                )));
            }
        }
        Ok(())
    }
}

/// Picks a block size from a working-set budget
///
/// The largest `block_size` with `2 * block_size * head_dim * 4 <= working_set_bytes`
/// (a query tile plus a key/value tile of `f32`), clamped to
/// `[min_block_size, max_block_size]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockSizeHeuristic {
    /// Target working set in bytes (roughly one L1 data cache)
    pub working_set_bytes: usize,
    pub min_block_size: usize,
    pub max_block_size: usize,
}

impl Default for BlockSizeHeuristic {
    fn default() -> Self {
        Self {
            working_set_bytes: 32 * 1024,
            min_block_size: 32,
            max_block_size: 128,
        }
    }
}

impl BlockSizeHeuristic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_set_bytes(mut self, working_set_bytes: usize) -> Self {
        self.working_set_bytes = working_set_bytes;
        self
    }

    pub fn with_bounds(mut self, min_block_size: usize, max_block_size: usize) -> Self {
        self.min_block_size = min_block_size;
        self.max_block_size = max_block_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_block_size == 0 {
            return Err("min_block_size must be > 0".to_string());
        }
        if self.min_block_size > self.max_block_size {
            return Err(format!(
                "min_block_size ({}) must be <= max_block_size ({})",
                self.min_block_size, self.max_block_size
            ));
        }
        Ok(())
    }

    /// Block size for the given head dimension
    pub fn block_size_for(&self, head_dim: usize) -> usize {
        let bytes_per_row = 2 * head_dim.max(1) * std::mem::size_of::<f32>();
        let fit = self.working_set_bytes / bytes_per_row;
        fit.clamp(self.min_block_size, self.max_block_size.max(self.min_block_size))
    }

    /// Explicit block size from `config`, otherwise the heuristic
    pub fn resolve(&self, config: &AttentionConfig) -> usize {
        config
            .block_size
            .unwrap_or_else(|| self.block_size_for(config.head_dim))
    }
}
