//! Mechanism selection policy
//!
//! A pure function from `(sequence_length, batch_size, resource hint)` to a
//! [`KernelChoice`]. For a fixed batch size, growing the sequence length never
//! moves the choice to a kernel with a higher [`KernelChoice::memory_rank`].

use crate::attention::KernelChoice;
use crate::catalog::MechanismType;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Default sequence length above which the tiled kernel is used
pub const DEFAULT_TILED_THRESHOLD: usize = 512;

/// Default sequence length above which the linear approximation may be used
pub const DEFAULT_LINEAR_THRESHOLD: usize = 8192;

/// Sequence-length thresholds for the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub tiled_threshold: usize,
    pub linear_threshold: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            tiled_threshold: DEFAULT_TILED_THRESHOLD,
            linear_threshold: DEFAULT_LINEAR_THRESHOLD,
        }
    }
}

impl SelectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiled_threshold(mut self, threshold: usize) -> Self {
        self.tiled_threshold = threshold;
        self
    }

    pub fn with_linear_threshold(mut self, threshold: usize) -> Self {
        self.linear_threshold = threshold;
        self
    }

    /// The linear threshold must not sit below the tiled one
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.linear_threshold < self.tiled_threshold {
            return Err(ConfigError::InvalidValue(format!(
                "linear_threshold ({}) must be >= tiled_threshold ({})",
                self.linear_threshold, self.tiled_threshold
            )));
        }
        Ok(())
    }
}

/// Optional caller constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceHint {
    /// Upper bound for the reference kernel's score matrices, in bytes
    pub memory_budget_bytes: Option<usize>,
    /// Caller accepts the approximate linear kernel
    pub allow_approximate: bool,
}

impl ResourceHint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }

    pub fn with_allow_approximate(mut self, allow: bool) -> Self {
        self.allow_approximate = allow;
        self
    }
}

/// Bytes of `batch_size` `[seq_len, seq_len]` f32 score matrices (saturating)
pub fn reference_score_bytes(sequence_length: usize, batch_size: usize) -> usize {
    batch_size
        .saturating_mul(sequence_length)
        .saturating_mul(sequence_length)
        .saturating_mul(std::mem::size_of::<f32>())
}

/// Stateless kernel selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MechanismSelector {
    config: SelectorConfig,
}

impl MechanismSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Pick a kernel for this workload
    pub fn select(
        &self,
        sequence_length: usize,
        batch_size: usize,
        hint: Option<&ResourceHint>,
    ) -> KernelChoice {
        let allow_approximate = hint.is_some_and(|h| h.allow_approximate);
        if allow_approximate && sequence_length > self.config.linear_threshold {
            return KernelChoice::LinearApprox;
        }

        if sequence_length > self.config.tiled_threshold {
            return KernelChoice::Tiled;
        }

        if let Some(budget) = hint.and_then(|h| h.memory_budget_bytes) {
            if reference_score_bytes(sequence_length, batch_size) > budget {
                return KernelChoice::Tiled;
            }
        }

        KernelChoice::Reference
    }
}

/// Resolved dispatch decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismChoice {
    pub kernel: KernelChoice,
    pub mechanism: MechanismType,
    /// Units run in parallel on the worker pool
    pub accelerated: bool,
}

impl MechanismChoice {
    pub fn new(kernel: KernelChoice, accelerated: bool) -> Self {
        Self {
            kernel,
            mechanism: kernel.mechanism(),
            accelerated,
        }
    }
}
