//! Catalog of attention mechanisms
//!
//! Static metadata for the 39 mechanism types the system knows about. Only
//! three of them have numeric kernels in this crate (see
//! [`KernelChoice::mechanism`](crate::attention::KernelChoice::mechanism));
//! the rest are descriptive entries used for lookup and recommendation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown attention mechanism: {0}")]
pub struct UnknownMechanism(pub String);

/// Attention mechanism identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MechanismType {
    StandardMha,
    RotaryMha,
    AlibiMha,
    GroupedQueryAttention,
    MultiQueryAttention,
    DifferentialAttention,
    MixtureAttention,
    CausalSelfAttention,
    BidirectionalSelfAttention,
    RelativePositionAttention,
    DisentangledAttention,
    TalkingHeadsAttention,
    SynthesizerAttention,
    CrossAttention,
    PerceiverAttention,
    GatedCrossAttention,
    MemoryAttention,
    HierarchicalCrossAttention,
    BigbirdAttention,
    LongformerAttention,
    LocalAttention,
    StridedAttention,
    SparseTransformerAttention,
    StarAttention,
    BlockwiseAttention,
    RandomAttention,
    LinearAttention,
    PerformerAttention,
    CosformerAttention,
    RfaAttention,
    NystromAttention,
    LinformerAttention,
    FlashAttentionV2,
    FlashAttentionV3,
    FlashDecoding,
    MoeAttention,
    SoftMoeAttention,
    SwitchAttention,
    ExpertChoiceAttention,
}

impl MechanismType {
    pub const ALL: [MechanismType; 39] = [
        MechanismType::StandardMha,
        MechanismType::RotaryMha,
        MechanismType::AlibiMha,
        MechanismType::GroupedQueryAttention,
        MechanismType::MultiQueryAttention,
        MechanismType::DifferentialAttention,
        MechanismType::MixtureAttention,
        MechanismType::CausalSelfAttention,
        MechanismType::BidirectionalSelfAttention,
        MechanismType::RelativePositionAttention,
        MechanismType::DisentangledAttention,
        MechanismType::TalkingHeadsAttention,
        MechanismType::SynthesizerAttention,
        MechanismType::CrossAttention,
        MechanismType::PerceiverAttention,
        MechanismType::GatedCrossAttention,
        MechanismType::MemoryAttention,
        MechanismType::HierarchicalCrossAttention,
        MechanismType::BigbirdAttention,
        MechanismType::LongformerAttention,
        MechanismType::LocalAttention,
        MechanismType::StridedAttention,
        MechanismType::SparseTransformerAttention,
        MechanismType::StarAttention,
        MechanismType::BlockwiseAttention,
        MechanismType::RandomAttention,
        MechanismType::LinearAttention,
        MechanismType::PerformerAttention,
        MechanismType::CosformerAttention,
        MechanismType::RfaAttention,
        MechanismType::NystromAttention,
        MechanismType::LinformerAttention,
        MechanismType::FlashAttentionV2,
        MechanismType::FlashAttentionV3,
        MechanismType::FlashDecoding,
        MechanismType::MoeAttention,
        MechanismType::SoftMoeAttention,
        MechanismType::SwitchAttention,
        MechanismType::ExpertChoiceAttention,
    ];

    /// Kebab-case identifier, e.g. `"flash-attention-v2"`
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanismType::StandardMha => "standard-mha",
            MechanismType::RotaryMha => "rotary-mha",
            MechanismType::AlibiMha => "alibi-mha",
            MechanismType::GroupedQueryAttention => "grouped-query-attention",
            MechanismType::MultiQueryAttention => "multi-query-attention",
            MechanismType::DifferentialAttention => "differential-attention",
            MechanismType::MixtureAttention => "mixture-attention",
            MechanismType::CausalSelfAttention => "causal-self-attention",
            MechanismType::BidirectionalSelfAttention => "bidirectional-self-attention",
            MechanismType::RelativePositionAttention => "relative-position-attention",
            MechanismType::DisentangledAttention => "disentangled-attention",
            MechanismType::TalkingHeadsAttention => "talking-heads-attention",
            MechanismType::SynthesizerAttention => "synthesizer-attention",
            MechanismType::CrossAttention => "cross-attention",
            MechanismType::PerceiverAttention => "perceiver-attention",
            MechanismType::GatedCrossAttention => "gated-cross-attention",
            MechanismType::MemoryAttention => "memory-attention",
            MechanismType::HierarchicalCrossAttention => "hierarchical-cross-attention",
            MechanismType::BigbirdAttention => "bigbird-attention",
            MechanismType::LongformerAttention => "longformer-attention",
            MechanismType::LocalAttention => "local-attention",
            MechanismType::StridedAttention => "strided-attention",
            MechanismType::SparseTransformerAttention => "sparse-transformer-attention",
            MechanismType::StarAttention => "star-attention",
            MechanismType::BlockwiseAttention => "blockwise-attention",
            MechanismType::RandomAttention => "random-attention",
            MechanismType::LinearAttention => "linear-attention",
            MechanismType::PerformerAttention => "performer-attention",
            MechanismType::CosformerAttention => "cosformer-attention",
            MechanismType::RfaAttention => "rfa-attention",
            MechanismType::NystromAttention => "nystrom-attention",
            MechanismType::LinformerAttention => "linformer-attention",
            MechanismType::FlashAttentionV2 => "flash-attention-v2",
            MechanismType::FlashAttentionV3 => "flash-attention-v3",
            MechanismType::FlashDecoding => "flash-decoding",
            MechanismType::MoeAttention => "moe-attention",
            MechanismType::SoftMoeAttention => "soft-moe-attention",
            MechanismType::SwitchAttention => "switch-attention",
            MechanismType::ExpertChoiceAttention => "expert-choice-attention",
        }
    }

    pub fn metadata(&self) -> &'static MechanismMetadata {
        metadata(*self)
    }
}

impl fmt::Display for MechanismType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MechanismType {
    type Err = UnknownMechanism;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MechanismType::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMechanism(s.to_string()))
    }
}

/// Mechanism family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MechanismCategory {
    MultiHead,
    SelfAttention,
    CrossAttention,
    Sparse,
    Linear,
    Flash,
    Moe,
}

/// Execution backend a mechanism can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Parallel worker-pool dispatch
    Accelerated,
    /// Plain sequential implementation
    Portable,
}

const ACCELERATED_BACKENDS: &[Backend] = &[Backend::Accelerated, Backend::Portable];
const PORTABLE_BACKENDS: &[Backend] = &[Backend::Portable];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MechanismMetadata {
    pub mechanism: MechanismType,
    pub name: &'static str,
    pub description: &'static str,
    pub category: MechanismCategory,
    /// Asymptotic cost, e.g. `"O(n²d)"`
    pub complexity: &'static str,
    pub supported_backends: &'static [Backend],
    pub memory_efficient: bool,
    pub long_sequence_support: bool,
    pub accelerated: bool,
}

#[allow(clippy::too_many_arguments)]
const fn meta(
    mechanism: MechanismType,
    name: &'static str,
    description: &'static str,
    category: MechanismCategory,
    complexity: &'static str,
    memory_efficient: bool,
    long_sequence_support: bool,
    accelerated: bool,
) -> MechanismMetadata {
    MechanismMetadata {
        mechanism,
        name,
        description,
        category,
        complexity,
        supported_backends: if accelerated {
            ACCELERATED_BACKENDS
        } else {
            PORTABLE_BACKENDS
        },
        memory_efficient,
        long_sequence_support,
        accelerated,
    }
}

/// One entry per [`MechanismType`], in declaration order
static CATALOG: [MechanismMetadata; 39] = [
    meta(
        MechanismType::StandardMha,
        "Standard Multi-Head Attention",
        "Classic multi-head attention from \"Attention Is All You Need\"",
        MechanismCategory::MultiHead,
        "O(n²d)",
        false,
        false,
        true,
    ),
    meta(
        MechanismType::RotaryMha,
        "Rotary Position Embedding MHA",
        "RoPE-enhanced attention for better position encoding",
        MechanismCategory::MultiHead,
        "O(n²d)",
        false,
        true,
        false,
    ),
    meta(
        MechanismType::AlibiMha,
        "ALiBi Attention",
        "Attention with Linear Biases for length extrapolation",
        MechanismCategory::MultiHead,
        "O(n²d)",
        false,
        true,
        false,
    ),
    meta(
        MechanismType::GroupedQueryAttention,
        "Grouped Query Attention",
        "GQA with shared key-value heads for efficiency",
        MechanismCategory::MultiHead,
        "O(n²d/g)",
        true,
        false,
        false,
    ),
    meta(
        MechanismType::MultiQueryAttention,
        "Multi-Query Attention",
        "Single key-value head shared across all queries",
        MechanismCategory::MultiHead,
        "O(n²d/h)",
        true,
        false,
        false,
    ),
    meta(
        MechanismType::DifferentialAttention,
        "Differential Attention",
        "Attention with differential computation for noise reduction",
        MechanismCategory::MultiHead,
        "O(n²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::MixtureAttention,
        "Mixture Attention",
        "Mixture of attention patterns with learned weights",
        MechanismCategory::MultiHead,
        "O(kn²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::CausalSelfAttention,
        "Causal Self-Attention",
        "Autoregressive attention with causal masking",
        MechanismCategory::SelfAttention,
        "O(n²d)",
        false,
        false,
        true,
    ),
    meta(
        MechanismType::BidirectionalSelfAttention,
        "Bidirectional Self-Attention",
        "Full bidirectional attention without masking",
        MechanismCategory::SelfAttention,
        "O(n²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::RelativePositionAttention,
        "Relative Position Attention",
        "Attention with relative position representations",
        MechanismCategory::SelfAttention,
        "O(n²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::DisentangledAttention,
        "Disentangled Attention",
        "DeBERTa-style disentangled content and position attention",
        MechanismCategory::SelfAttention,
        "O(n²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::TalkingHeadsAttention,
        "Talking Heads Attention",
        "Linear projections across attention heads",
        MechanismCategory::SelfAttention,
        "O(n²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::SynthesizerAttention,
        "Synthesizer Attention",
        "Learned attention patterns without query-key dot product",
        MechanismCategory::SelfAttention,
        "O(nd)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::CrossAttention,
        "Cross-Attention",
        "Standard cross-attention between two sequences",
        MechanismCategory::CrossAttention,
        "O(nmd)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::PerceiverAttention,
        "Perceiver Cross-Attention",
        "Asymmetric attention with learned latent array",
        MechanismCategory::CrossAttention,
        "O(lnd)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::GatedCrossAttention,
        "Gated Cross-Attention",
        "Cross-attention with learned gating mechanism",
        MechanismCategory::CrossAttention,
        "O(nmd)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::MemoryAttention,
        "Memory Attention",
        "Attention to external memory bank",
        MechanismCategory::CrossAttention,
        "O(nmd)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::HierarchicalCrossAttention,
        "Hierarchical Cross-Attention",
        "Multi-level cross-attention for hierarchical data",
        MechanismCategory::CrossAttention,
        "O(nmd)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::BigbirdAttention,
        "BigBird Attention",
        "Sparse attention with global, local, and random patterns",
        MechanismCategory::Sparse,
        "O(n√n)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::LongformerAttention,
        "Longformer Attention",
        "Sliding window attention with global tokens",
        MechanismCategory::Sparse,
        "O(nw)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::LocalAttention,
        "Local Attention",
        "Fixed-size local attention window",
        MechanismCategory::Sparse,
        "O(nw)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::StridedAttention,
        "Strided Attention",
        "Sparse attention with strided patterns",
        MechanismCategory::Sparse,
        "O(n√n)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::SparseTransformerAttention,
        "Sparse Transformer Attention",
        "Fixed sparse attention patterns",
        MechanismCategory::Sparse,
        "O(n√n)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::StarAttention,
        "Star Attention",
        "Hub-and-spoke sparse pattern",
        MechanismCategory::Sparse,
        "O(n)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::BlockwiseAttention,
        "Blockwise Attention",
        "Block-diagonal sparse attention",
        MechanismCategory::Sparse,
        "O(nb²)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::RandomAttention,
        "Random Attention",
        "Randomly sampled attention positions",
        MechanismCategory::Sparse,
        "O(nr)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::LinearAttention,
        "Linear Attention",
        "O(n) attention using kernel feature maps",
        MechanismCategory::Linear,
        "O(nd²)",
        true,
        true,
        true,
    ),
    meta(
        MechanismType::PerformerAttention,
        "Performer (FAVOR+)",
        "Fast attention via orthogonal random features",
        MechanismCategory::Linear,
        "O(ndr)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::CosformerAttention,
        "CosFormer Attention",
        "Linear attention with cosine reweighting",
        MechanismCategory::Linear,
        "O(nd)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::RfaAttention,
        "Random Feature Attention",
        "Attention approximation via random features",
        MechanismCategory::Linear,
        "O(ndr)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::NystromAttention,
        "Nyström Attention",
        "Low-rank approximation via Nyström method",
        MechanismCategory::Linear,
        "O(nm)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::LinformerAttention,
        "Linformer Attention",
        "Self-attention with linear complexity via projection",
        MechanismCategory::Linear,
        "O(nk)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::FlashAttentionV2,
        "Flash Attention v2",
        "IO-aware exact attention with tiling",
        MechanismCategory::Flash,
        "O(n²d)",
        true,
        true,
        true,
    ),
    meta(
        MechanismType::FlashAttentionV3,
        "Flash Attention v3",
        "Latest Flash Attention with improved parallelism",
        MechanismCategory::Flash,
        "O(n²d)",
        true,
        true,
        true,
    ),
    meta(
        MechanismType::FlashDecoding,
        "Flash Decoding",
        "Optimized Flash Attention for inference decoding",
        MechanismCategory::Flash,
        "O(n²d)",
        true,
        true,
        false,
    ),
    meta(
        MechanismType::MoeAttention,
        "MoE Attention",
        "Mixture of Experts attention with routing",
        MechanismCategory::Moe,
        "O(kn²d/e)",
        true,
        false,
        false,
    ),
    meta(
        MechanismType::SoftMoeAttention,
        "Soft MoE Attention",
        "Fully differentiable soft routing MoE",
        MechanismCategory::Moe,
        "O(n²d)",
        false,
        false,
        false,
    ),
    meta(
        MechanismType::SwitchAttention,
        "Switch Attention",
        "Switch Transformer style sparse MoE",
        MechanismCategory::Moe,
        "O(n²d/e)",
        true,
        false,
        false,
    ),
    meta(
        MechanismType::ExpertChoiceAttention,
        "Expert Choice Attention",
        "Expert-choice routing for better load balance",
        MechanismCategory::Moe,
        "O(cn²d)",
        true,
        false,
        false,
    ),
];

/// Metadata for one mechanism
pub fn metadata(mechanism: MechanismType) -> &'static MechanismMetadata {
    // CATALOG is indexed by discriminant
    &CATALOG[mechanism as usize]
}

/// All entries
pub fn list() -> &'static [MechanismMetadata] {
    &CATALOG
}

pub fn by_category(category: MechanismCategory) -> Vec<&'static MechanismMetadata> {
    CATALOG.iter().filter(|m| m.category == category).collect()
}

/// Mechanisms with an accelerated backend
pub fn accelerated() -> Vec<&'static MechanismMetadata> {
    CATALOG.iter().filter(|m| m.accelerated).collect()
}

pub fn memory_efficient() -> Vec<&'static MechanismMetadata> {
    CATALOG.iter().filter(|m| m.memory_efficient).collect()
}

pub fn long_sequence() -> Vec<&'static MechanismMetadata> {
    CATALOG.iter().filter(|m| m.long_sequence_support).collect()
}

/// Number of mechanisms per category
pub fn category_counts() -> BTreeMap<MechanismCategory, usize> {
    let mut counts = BTreeMap::new();
    for m in CATALOG.iter() {
        *counts.entry(m.category).or_insert(0) += 1;
    }
    counts
}

/// Catalog recommendation by sequence length alone
///
/// Above 8192 tokens `linear-attention`, above 512 `flash-attention-v2`,
/// otherwise `standard-mha`. Unlike
/// [`MechanismSelector`](crate::attention::MechanismSelector) this does not
/// require opting in to approximation.
pub fn recommend_mechanism(sequence_length: usize) -> MechanismType {
    if sequence_length > 8192 {
        MechanismType::LinearAttention
    } else if sequence_length > 512 {
        MechanismType::FlashAttentionV2
    } else {
        MechanismType::StandardMha
    }
}

pub fn is_accelerated(mechanism: MechanismType) -> bool {
    metadata(mechanism).accelerated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_indexed_by_discriminant() {
        for (i, mechanism) in MechanismType::ALL.iter().enumerate() {
            assert_eq!(*mechanism as usize, i);
            assert_eq!(metadata(*mechanism).mechanism, *mechanism);
        }
    }

    #[test]
    fn test_category_counts() {
        let counts = category_counts();
        assert_eq!(counts[&MechanismCategory::MultiHead], 7);
        assert_eq!(counts[&MechanismCategory::SelfAttention], 6);
        assert_eq!(counts[&MechanismCategory::CrossAttention], 5);
        assert_eq!(counts[&MechanismCategory::Sparse], 8);
        assert_eq!(counts[&MechanismCategory::Linear], 6);
        assert_eq!(counts[&MechanismCategory::Flash], 3);
        assert_eq!(counts[&MechanismCategory::Moe], 4);
        assert_eq!(counts.values().sum::<usize>(), 39);
    }

    #[test]
    fn test_string_round_trip() {
        for mechanism in MechanismType::ALL {
            assert_eq!(mechanism.as_str().parse::<MechanismType>(), Ok(mechanism));
            let json = serde_json::to_string(&mechanism).unwrap();
            assert_eq!(json, format!("\"{}\"", mechanism.as_str()));
        }
        assert!("flash-attention-v9".parse::<MechanismType>().is_err());
    }

    #[test]
    fn test_accelerated_set() {
        let names: Vec<&str> = accelerated().iter().map(|m| m.mechanism.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "standard-mha",
                "causal-self-attention",
                "linear-attention",
                "flash-attention-v2",
                "flash-attention-v3",
            ]
        );
        assert!(is_accelerated(MechanismType::FlashAttentionV2));
        assert!(!is_accelerated(MechanismType::FlashDecoding));
        assert_eq!(
            metadata(MechanismType::StandardMha).supported_backends,
            &[Backend::Accelerated, Backend::Portable]
        );
    }

    #[test]
    fn test_recommend_mechanism_thresholds() {
        assert_eq!(recommend_mechanism(512), MechanismType::StandardMha);
        assert_eq!(recommend_mechanism(513), MechanismType::FlashAttentionV2);
        assert_eq!(recommend_mechanism(8192), MechanismType::FlashAttentionV2);
        assert_eq!(recommend_mechanism(8193), MechanismType::LinearAttention);
    }

    #[test]
    fn test_filters() {
        assert!(memory_efficient().iter().all(|m| m.memory_efficient));
        assert!(long_sequence().iter().all(|m| m.long_sequence_support));
        assert_eq!(by_category(MechanismCategory::Flash).len(), 3);
        assert!(!metadata(MechanismType::StandardMha).memory_efficient);
    }
}
