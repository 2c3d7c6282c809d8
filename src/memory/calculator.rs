//! Byte accounting for named buffers

use std::mem::size_of;

/// Sums the sizes of named buffers
///
/// All arithmetic saturates, so absurd shapes report `usize::MAX` instead of
/// wrapping.
///
/// # Example
/// ```
/// use attnforge::memory::MemoryCalculator;
///
/// let mut calc = MemoryCalculator::new();
/// calc.add_f32_buffer("query", 8 * 128 * 64);
/// calc.add_f32_buffer("scores", 8 * 128 * 128);
/// assert_eq!(calc.total_bytes(), (8 * 128 * 64 + 8 * 128 * 128) * 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCalculator {
    buffers: Vec<(String, usize)>,
}

impl MemoryCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a buffer of `element_count` elements of `element_size` bytes
    pub fn add_buffer(&mut self, name: impl Into<String>, element_count: usize, element_size: usize) {
        self.buffers
            .push((name.into(), element_count.saturating_mul(element_size)));
    }

    pub fn add_f32_buffer(&mut self, name: impl Into<String>, element_count: usize) {
        self.add_buffer(name, element_count, size_of::<f32>());
    }

    pub fn total_bytes(&self) -> usize {
        self.buffers
            .iter()
            .fold(0usize, |acc, (_, bytes)| acc.saturating_add(*bytes))
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Bytes of the buffer called `name`, if tracked
    pub fn buffer_bytes(&self, name: &str) -> Option<usize> {
        self.buffers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| *bytes)
    }

    pub fn buffers(&self) -> &[(String, usize)] {
        &self.buffers
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}
