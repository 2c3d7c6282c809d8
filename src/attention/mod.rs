//! Attention kernels for attnforge
//!
//! Implements scaled dot-product attention three ways:
//! - [`cpu`]: the quadratic reference kernel (full score matrix, correctness oracle)
//! - [`flash_attention`]: the tiled kernel with online softmax
//! - [`linear`]: an opt-in linear-complexity approximation
//!
//! [`selector`] decides which one runs; [`orchestrator`] fans the
//! `(batch, head)` units out over a worker pool and assembles the output.

pub mod backend;
pub mod backend_registry;
pub mod compare;
pub mod config;
pub mod cpu;
pub mod flash_attention;
pub mod linear;
pub mod mask;
pub mod orchestrator;
pub mod selector;
pub mod softmax;

#[cfg(test)]
mod causal_mask_tests;


#[cfg(test)]
mod flash_causal_tests;

pub use backend::KernelChoice;
pub use backend_registry::{AttentionKernel, HeadParams, KernelRegistry};
pub use config::{AttentionConfig, BlockSizeHeuristic};
pub use orchestrator::{AttentionOutput, CancellationToken, Orchestrator};
pub use selector::{MechanismChoice, MechanismSelector, ResourceHint, SelectorConfig};

use crate::tensor::{matmul::MatmulError, Tensor};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttentionError {
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    #[error("Invalid block size: {0} (must be > 0)")]
    InvalidBlockSize(usize),
    #[error("Attention cancelled after {completed} of {total} units")]
    Cancelled { completed: usize, total: usize },
    #[error("Worker pool creation failed: {0}")]
    ThreadPool(String),
}

impl From<MatmulError> for AttentionError {
    fn from(err: MatmulError) -> Self {
        AttentionError::InvalidShape(err.to_string())
    }
}

pub type AttentionResult<T> = Result<T, AttentionError>;

/// Compute attention for `[batch, heads, seq_len, head_dim]` tensors.
///
/// Uses a default [`Orchestrator`] (rayon's global pool, default thresholds).
/// Repeated calls share no state.
pub fn compute_attention(
    query: &Tensor,
    key: &Tensor,
    value: &Tensor,
    config: &AttentionConfig,
) -> AttentionResult<AttentionOutput> {
    Orchestrator::with_defaults().compute(query, key, value, config)
}

/// Kernel the default selector picks for this workload, without running it
pub fn select_mechanism(sequence_length: usize, batch_size: usize) -> KernelChoice {
    MechanismSelector::default().select(sequence_length, batch_size, None)
}
