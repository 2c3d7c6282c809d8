//! Kernel registry with pluggable per-head implementations

use crate::attention::{cpu, flash_attention, linear, AttentionResult, KernelChoice};
use crate::tensor::MatrixView;

/// Per-head options passed to a kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadParams {
    pub causal: bool,
    /// Resolved tile size; only the tiled kernel reads it
    pub block_size: usize,
}

/// A kernel that computes attention for one `(batch, head)` unit
///
/// Implementations write exactly `seq_len * head_dim` values into `out` and
/// never keep references to their inputs.
pub trait AttentionKernel: Send + Sync {
    /// Kernel name
    fn name(&self) -> &str;

    /// Which dispatch choice this kernel serves
    fn choice(&self) -> KernelChoice;

    /// Whether `forward_head` can fill an attention-weights buffer
    fn supports_weights(&self) -> bool {
        false
    }

    /// Compute one head
    ///
    /// `weights` is only passed when [`supports_weights`](Self::supports_weights)
    /// returns true.
    fn forward_head(
        &self,
        q: MatrixView<'_>,
        k: MatrixView<'_>,
        v: MatrixView<'_>,
        params: &HeadParams,
        out: &mut [f32],
        weights: Option<&mut [f32]>,
    ) -> AttentionResult<()>;
}

/// Quadratic kernel, see [`cpu::reference_attention_head`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceKernel;

impl AttentionKernel for ReferenceKernel {
    fn name(&self) -> &str {
        "reference"
    }

    fn choice(&self) -> KernelChoice {
        KernelChoice::Reference
    }

    fn supports_weights(&self) -> bool {
        true
    }

    fn forward_head(
        &self,
        q: MatrixView<'_>,
        k: MatrixView<'_>,
        v: MatrixView<'_>,
        params: &HeadParams,
        out: &mut [f32],
        weights: Option<&mut [f32]>,
    ) -> AttentionResult<()> {
        cpu::reference_attention_head(q, k, v, params.causal, out, weights)
    }
}

/// Block-wise kernel, see [`flash_attention::flash_attention_head`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TiledKernel;

impl AttentionKernel for TiledKernel {
    fn name(&self) -> &str {
        "tiled"
    }

    fn choice(&self) -> KernelChoice {
        KernelChoice::Tiled
    }

    fn forward_head(
        &self,
        q: MatrixView<'_>,
        k: MatrixView<'_>,
        v: MatrixView<'_>,
        params: &HeadParams,
        out: &mut [f32],
        _weights: Option<&mut [f32]>,
    ) -> AttentionResult<()> {
        flash_attention::flash_attention_head(q, k, v, params.causal, params.block_size, out)
    }
}

/// Feature-map approximation, see [`linear::linear_attention_head`]
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearKernel;

impl AttentionKernel for LinearKernel {
    fn name(&self) -> &str {
        "linear_approx"
    }

    fn choice(&self) -> KernelChoice {
        KernelChoice::LinearApprox
    }

    fn forward_head(
        &self,
        q: MatrixView<'_>,
        k: MatrixView<'_>,
        v: MatrixView<'_>,
        params: &HeadParams,
        out: &mut [f32],
        _weights: Option<&mut [f32]>,
    ) -> AttentionResult<()> {
        linear::linear_attention_head(q, k, v, params.causal, out)
    }
}

/// Maps every [`KernelChoice`] to an implementation
pub struct KernelRegistry {
    reference: Box<dyn AttentionKernel>,
    tiled: Box<dyn AttentionKernel>,
    linear: Box<dyn AttentionKernel>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            reference: Box::new(ReferenceKernel),
            tiled: Box::new(TiledKernel),
            linear: Box::new(LinearKernel),
        }
    }

    /// Replace the implementation serving `kernel.choice()`
    pub fn register(&mut self, kernel: Box<dyn AttentionKernel>) {
        tracing::debug!(kernel = kernel.name(), choice = %kernel.choice(), "Registering attention kernel");
        match kernel.choice() {
            KernelChoice::Reference => self.reference = kernel,
            KernelChoice::Tiled => self.tiled = kernel,
            KernelChoice::LinearApprox => self.linear = kernel,
        }
    }

    pub fn get(&self, choice: KernelChoice) -> &dyn AttentionKernel {
        match choice {
            KernelChoice::Reference => self.reference.as_ref(),
            KernelChoice::Tiled => self.tiled.as_ref(),
            KernelChoice::LinearApprox => self.linear.as_ref(),
        }
    }

    /// Names of the registered kernels
    pub fn list_kernels(&self) -> Vec<String> {
        KernelChoice::ALL
            .iter()
            .map(|&choice| self.get(choice).name().to_string())
            .collect()
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("kernels", &self.list_kernels())
            .finish()
    }
}
