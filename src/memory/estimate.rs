//! Per-kernel memory estimates
//!
//! Every estimate counts the four `[batch, heads, seq_len, head_dim]` tensors
//! (Q, K, V, output) plus the kernel's working set for all `batch * heads`
//! units:
//!
//! | kernel    | working set per unit                 |
//! |-----------|--------------------------------------|
//! | reference | `seq_len²` scores (+ `seq_len²` weights) |
//! | tiled     | `b²` score tile + `b` max + `b` sum, `b = min(block_size, seq_len)` |
//! | linear    | `head_dim²` state + `head_dim` key sum + `head_dim` feature row |
//!
//! All values are `f32` and all arithmetic saturates.

use crate::attention::AttentionConfig;
use crate::memory::MemoryCalculator;

fn io_buffers(config: &AttentionConfig) -> MemoryCalculator {
    let elements = config.num_units().saturating_mul(config.head_stride());
    let mut calc = MemoryCalculator::new();
    for name in ["query", "key", "value", "output"] {
        calc.add_f32_buffer(name, elements);
    }
    calc
}

fn per_unit(config: &AttentionConfig, elements: usize) -> usize {
    config.num_units().saturating_mul(elements)
}

/// Bytes used by the reference kernel
pub fn estimate_reference_memory_bytes(config: &AttentionConfig) -> usize {
    let scores = config.seq_len.saturating_mul(config.seq_len);
    let mut calc = io_buffers(config);
    calc.add_f32_buffer("scores", per_unit(config, scores));
    if config.return_weights {
        calc.add_f32_buffer("weights", per_unit(config, scores));
    }
    calc.total_bytes()
}

/// Bytes used by the tiled kernel with `block_size` (0 is treated as 1)
pub fn estimate_tiled_memory_bytes(config: &AttentionConfig, block_size: usize) -> usize {
    let b = block_size.max(1).min(config.seq_len);
    let mut calc = io_buffers(config);
    calc.add_f32_buffer("score_tile", per_unit(config, b.saturating_mul(b)));
    calc.add_f32_buffer("row_max", per_unit(config, b));
    calc.add_f32_buffer("row_sum", per_unit(config, b));
    calc.total_bytes()
}

/// Bytes used by the linear approximation kernel
pub fn estimate_linear_memory_bytes(config: &AttentionConfig) -> usize {
    let d = config.head_dim;
    let mut calc = io_buffers(config);
    calc.add_f32_buffer("kv_state", per_unit(config, d.saturating_mul(d)));
    calc.add_f32_buffer("key_sum", per_unit(config, d));
    calc.add_f32_buffer("feature_row", per_unit(config, d));
    calc.total_bytes()
}

/// Reference vs tiled memory for one configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryReport {
    pub reference_bytes: usize,
    pub tiled_bytes: usize,
    pub block_size: usize,
}

impl MemoryReport {
    pub fn new(config: &AttentionConfig, block_size: usize) -> Self {
        Self {
            reference_bytes: estimate_reference_memory_bytes(config),
            tiled_bytes: estimate_tiled_memory_bytes(config, block_size),
            block_size,
        }
    }

    /// `(reference − tiled) / reference`; negative when tiling costs more
    pub fn reduction(&self) -> f64 {
        if self.reference_bytes == 0 {
            return 0.0;
        }
        (self.reference_bytes as f64 - self.tiled_bytes as f64) / self.reference_bytes as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_estimate() {
        let config = AttentionConfig::new(2, 3, 4, 5);
        // io: 4 * 2*3*4*5 * 4 = 1920; scores: 2*3*16*4 = 384
        assert_eq!(estimate_reference_memory_bytes(&config), 1920 + 384);
        let with_weights = config.with_return_weights(true);
        assert_eq!(estimate_reference_memory_bytes(&with_weights), 1920 + 2 * 384);
    }

    #[test]
    fn test_tiled_estimate() {
        let config = AttentionConfig::new(1, 2, 100, 8);
        // io: 4 * 2*100*8 * 4 = 25600; tile: 2 * (16*16 + 2*16) * 4 = 2304
        assert_eq!(estimate_tiled_memory_bytes(&config, 16), 25600 + 2304);
        // block larger than the sequence clamps to seq_len
        assert_eq!(
            estimate_tiled_memory_bytes(&config, 1000),
            estimate_tiled_memory_bytes(&config, 100)
        );
    }

    #[test]
    fn test_linear_estimate() {
        let config = AttentionConfig::new(1, 1, 10, 4);
        // io: 4 * 40 * 4 = 640; state: (16 + 4 + 4) * 4 = 96
        assert_eq!(estimate_linear_memory_bytes(&config), 640 + 96);
    }

    #[test]
    fn test_memory_report_reduction() {
        let config = AttentionConfig::new(1, 8, 1024, 64);
        let report = MemoryReport::new(&config, 64);
        assert!(report.tiled_bytes < report.reference_bytes);
        assert!(report.reduction() > 0.5);
        assert!(report.reduction() < 1.0);
    }

    #[test]
    fn test_estimates_saturate() {
        let config = AttentionConfig::new(usize::MAX, 2, 2, 2);
        assert_eq!(estimate_reference_memory_bytes(&config), usize::MAX);
        assert_eq!(estimate_tiled_memory_bytes(&config, 0), usize::MAX);
    }
}
