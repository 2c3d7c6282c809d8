//! Wall-clock timing for attention kernels
//!
//! All kernels run on the host, so timing is `std::time::Instant` based.

use std::time::Instant;

/// Start/stop timer for one named kernel
///
/// # Example
///
/// ```rust
/// use attnforge::profiling::KernelTimer;
///
/// let mut timer = KernelTimer::for_kernel("tiled");
/// timer.start();
/// // ... run kernel ...
/// timer.stop();
/// assert!(timer.elapsed().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct KernelTimer {
    name: String,
    start: Option<Instant>,
    elapsed_ms: Option<f32>,
}

impl KernelTimer {
    pub fn for_kernel(name: impl Into<String>) -> Self {
        KernelTimer {
            name: name.into(),
            start: None,
            elapsed_ms: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start (or restart) timing; clears any previous measurement
    pub fn start(&mut self) {
        self.start = Some(Instant::now());
        self.elapsed_ms = None;
    }

    /// Stop timing. No-op if the timer was never started.
    pub fn stop(&mut self) {
        if let Some(start) = self.start {
            self.elapsed_ms = Some(start.elapsed().as_secs_f64() as f32 * 1000.0);
        }
    }

    /// Elapsed time in milliseconds, `None` until stopped
    pub fn elapsed(&self) -> Option<f32> {
        self.elapsed_ms
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.elapsed_ms.is_some()
    }
}

/// Timer that logs its elapsed time through `tracing` when dropped
#[derive(Debug)]
pub struct ScopedTimer {
    name: String,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(name: impl Into<String>) -> Self {
        ScopedTimer {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Elapsed time in milliseconds so far
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f64() as f32 * 1000.0
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        tracing::debug!(timer = %self.name, elapsed_ms = self.elapsed(), "Timer finished");
    }
}

/// Timing summary of repeated runs
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub name: String,
    pub iterations: usize,
    pub total_ms: f32,
    pub min_ms: f32,
    pub max_ms: f32,
}

impl IterationReport {
    pub fn mean_ms(&self) -> f32 {
        if self.iterations == 0 {
            0.0
        } else {
            self.total_ms / self.iterations as f32
        }
    }
}

/// Run `f` `iterations` times and report elapsed time
pub fn time_iterations<F: FnMut()>(name: impl Into<String>, iterations: usize, mut f: F) -> IterationReport {
    let mut timer = KernelTimer::for_kernel(name);
    let mut total_ms = 0.0f32;
    let mut min_ms = f32::INFINITY;
    let mut max_ms = 0.0f32;

    for _ in 0..iterations {
        timer.start();
        f();
        timer.stop();
        let ms = timer.elapsed().unwrap_or(0.0);
        total_ms += ms;
        min_ms = min_ms.min(ms);
        max_ms = max_ms.max(ms);
    }

    if iterations == 0 {
        min_ms = 0.0;
    }

    IterationReport {
        name: timer.name().to_string(),
        iterations,
        total_ms,
        min_ms,
        max_ms,
    }
}
