//! Memory accounting for attention calls
//!
//! [`MemoryCalculator`] sums named `f32` buffers; the `estimate_*` functions
//! use it to predict the bytes each kernel touches for a given
//! [`AttentionConfig`](crate::attention::AttentionConfig), so callers can
//! compare kernels (and set a selector memory budget) before running anything.

pub mod calculator;
pub mod estimate;

pub use calculator::MemoryCalculator;
pub use estimate::{
    estimate_linear_memory_bytes, estimate_reference_memory_bytes, estimate_tiled_memory_bytes,
    MemoryReport,
};
