//! Kernel identifiers for attention dispatch

use crate::catalog::MechanismType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which numeric kernel runs a `(batch, head)` unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelChoice {
    /// Quadratic kernel, materializes the full score matrix
    #[default]
    Reference,
    /// Block-wise kernel with online softmax
    Tiled,
    /// Kernel feature-map approximation, O(n) in sequence length
    LinearApprox,
}

impl KernelChoice {
    pub const ALL: [KernelChoice; 3] = [
        KernelChoice::Reference,
        KernelChoice::Tiled,
        KernelChoice::LinearApprox,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KernelChoice::Reference => "reference",
            KernelChoice::Tiled => "tiled",
            KernelChoice::LinearApprox => "linear_approx",
        }
    }

    /// Whether the kernel computes exact softmax attention
    pub fn is_exact(&self) -> bool {
        !matches!(self, KernelChoice::LinearApprox)
    }

    /// Relative working-set cost: 0 is cheapest
    ///
    /// LinearApprox keeps `head_dim²` state, Tiled keeps `block_size²`,
    /// Reference keeps `seq_len²`.
    pub fn memory_rank(&self) -> u8 {
        match self {
            KernelChoice::LinearApprox => 0,
            KernelChoice::Tiled => 1,
            KernelChoice::Reference => 2,
        }
    }

    /// Catalog entry this kernel implements
    pub fn mechanism(&self) -> MechanismType {
        match self {
            KernelChoice::Reference => MechanismType::StandardMha,
            KernelChoice::Tiled => MechanismType::FlashAttentionV2,
            KernelChoice::LinearApprox => MechanismType::LinearAttention,
        }
    }
}

impl fmt::Display for KernelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_rank_ordering() {
        assert!(KernelChoice::LinearApprox.memory_rank() < KernelChoice::Tiled.memory_rank());
        assert!(KernelChoice::Tiled.memory_rank() < KernelChoice::Reference.memory_rank());
    }

    #[test]
    fn test_only_linear_is_approximate() {
        assert!(KernelChoice::Reference.is_exact());
        assert!(KernelChoice::Tiled.is_exact());
        assert!(!KernelChoice::LinearApprox.is_exact());
    }

    #[test]
    fn test_mechanism_mapping() {
        assert_eq!(
            KernelChoice::Tiled.mechanism(),
            MechanismType::FlashAttentionV2
        );
        assert_eq!(KernelChoice::Reference.to_string(), "reference");
    }
}
