//! Causal masking helpers
//!
//! Positions are absolute sequence indices: query row `i` may attend to key
//! column `j` only when `j <= i`.

/// Whether `(query_pos, key_pos)` is hidden under causal masking
#[inline]
pub fn is_masked(causal: bool, query_pos: usize, key_pos: usize) -> bool {
    causal && key_pos > query_pos
}

/// Whether a whole key block starting at `kv_start` is hidden from every row
/// of the query block ending (exclusive) at `q_end`
#[inline]
pub fn block_fully_masked(causal: bool, q_end: usize, kv_start: usize) -> bool {
    causal && kv_start >= q_end
}

/// Whether any entry of the `[q_start, q_end) x [kv_start, kv_end)` tile is masked
#[inline]
pub fn block_needs_mask(causal: bool, q_start: usize, kv_end: usize) -> bool {
    causal && kv_end > q_start + 1
}

/// Set masked entries of a `[q_rows, kv_rows]` score tile to `-inf`
pub fn apply_causal_mask(
    scores: &mut [f32],
    q_rows: usize,
    kv_rows: usize,
    q_start: usize,
    kv_start: usize,
) {
    debug_assert_eq!(scores.len(), q_rows * kv_rows);
    if kv_rows == 0 {
        return;
    }
    for (qi, row) in scores.chunks_exact_mut(kv_rows).enumerate() {
        let query_pos = q_start + qi;
        // first masked column in this row, relative to the tile
        let first_masked = (query_pos + 1).saturating_sub(kv_start).min(kv_rows);
        for s in &mut row[first_masked..] {
            *s = f32::NEG_INFINITY;
        }
    }
}
