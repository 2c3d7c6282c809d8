//! Profiling utilities for attnforge
//!
//! - [`kernel_timer`] - start/stop and scoped timers for kernel calls, plus a
//!   "run N iterations" helper used by the benchmarks
//!
//! # Example
//!
//! ```rust
//! use attnforge::profiling::time_iterations;
//!
//! let report = time_iterations("noop", 3, || {});
//! assert_eq!(report.iterations, 3);
//! ```

pub mod kernel_timer;

pub use kernel_timer::{time_iterations, IterationReport, KernelTimer, ScopedTimer};
