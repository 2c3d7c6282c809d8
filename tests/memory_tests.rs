//! Memory estimates across kernels

use attnforge::attention::BlockSizeHeuristic;
use attnforge::{
    estimate_linear_memory_bytes, estimate_reference_memory_bytes, estimate_tiled_memory_bytes,
    AttentionConfig, MemoryReport,
};
use proptest::prelude::*;

#[test]
fn test_benchmark_shapes_save_memory() {
    for (heads, seq_len, head_dim) in [(8, 512, 128), (12, 1024, 64), (16, 2048, 64)] {
        let config = AttentionConfig::new(1, heads, seq_len, head_dim);
        let block_size = BlockSizeHeuristic::default().resolve(&config);
        let report = MemoryReport::new(&config, block_size);
        assert!(
            report.reduction() > 0.0,
            "heads={} seq_len={} reduction {}",
            heads,
            seq_len,
            report.reduction()
        );
    }
}

#[test]
fn test_linear_is_independent_of_score_matrix() {
    let short = AttentionConfig::new(1, 1, 1024, 32);
    let long = AttentionConfig::new(1, 1, 2048, 32);
    // Only the four io tensors grow with seq_len
    let io_growth = 4 * 1024 * 32 * 4;
    assert_eq!(
        estimate_linear_memory_bytes(&long) - estimate_linear_memory_bytes(&short),
        io_growth
    );
    assert!(estimate_linear_memory_bytes(&long) < estimate_reference_memory_bytes(&long));
}

#[test]
fn test_single_block_costs_at_least_reference() {
    // block_size >= seq_len: the tile is the full score matrix plus row stats
    let config = AttentionConfig::new(1, 1, 16, 8);
    let report = MemoryReport::new(&config, 64);
    assert!(report.tiled_bytes > report.reference_bytes);
    assert!(report.reduction() < 0.0);
}

proptest! {
    #[test]
    fn prop_tiled_non_decreasing_in_seq_len(
        batch in 1usize..4,
        heads in 1usize..8,
        seq_len in 1usize..4096,
        extra in 0usize..4096,
        head_dim in 1usize..128,
        block_size in 1usize..256,
    ) {
        let a = AttentionConfig::new(batch, heads, seq_len, head_dim);
        let b = AttentionConfig::new(batch, heads, seq_len + extra, head_dim);
        prop_assert!(estimate_tiled_memory_bytes(&a, block_size) <= estimate_tiled_memory_bytes(&b, block_size));
    }

    #[test]
    fn prop_tiled_below_reference_past_one_block(
        batch in 1usize..4,
        heads in 1usize..8,
        block_size in 1usize..128,
        extra in 2usize..2048,
        head_dim in 1usize..128,
    ) {
        // seq_len > block_size + 1 so b² + 2b < seq_len²
        let config = AttentionConfig::new(batch, heads, block_size + extra, head_dim);
        prop_assert!(
            estimate_tiled_memory_bytes(&config, block_size) < estimate_reference_memory_bytes(&config)
        );
    }
}
