//! attnforge - tiled attention kernels for the CPU
//!
//! Scaled dot-product attention over `[batch, heads, seq_len, head_dim]`
//! tensors, computed by one of three kernels:
//!
//! - a quadratic reference kernel that materializes the full score matrix,
//! - a tiled ("flash") kernel that streams key/value blocks through an online
//!   softmax and never holds more than one `block_size²` tile per head,
//! - an opt-in linear-complexity feature-map approximation.
//!
//! A pure selector picks the kernel from sequence length and resource hints;
//! an orchestrator runs the `(batch, head)` units on a rayon pool.
//!
//! ```
//! use attnforge::{compute_attention, AttentionConfig, Tensor};
//!
//! let config = AttentionConfig::new(1, 2, 16, 8).with_causal(true);
//! let q = Tensor::from_fn(config.qkv_shape(), |i| (i as f32 * 0.1).sin()).unwrap();
//! let out = compute_attention(&q, &q, &q, &config).unwrap();
//! assert_eq!(out.output.dims(), &[1, 2, 16, 8]);
//! ```

#![allow(clippy::needless_range_loop)] // index loops mirror the math in kernels

pub mod attention;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod profiling;
pub mod tensor;

pub use attention::{
    compute_attention, select_mechanism, AttentionConfig, AttentionError, AttentionOutput,
    AttentionResult, CancellationToken, KernelChoice, MechanismChoice, MechanismSelector,
    Orchestrator, ResourceHint, SelectorConfig,
};
pub use catalog::{MechanismCategory, MechanismType};
pub use config::{ConfigError, OrchestratorConfig};
pub use error::{AttnForgeError, ErrorCategory, ForgeResult};
pub use logging::{init_logging_default, init_logging_from_env, init_with_config, LoggingConfig};
pub use memory::{
    estimate_linear_memory_bytes, estimate_reference_memory_bytes, estimate_tiled_memory_bytes,
    MemoryReport,
};
pub use profiling::{KernelTimer, ScopedTimer};
pub use tensor::{Tensor, TensorShape};
