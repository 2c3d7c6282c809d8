//! Kernel orchestrator
//!
//! Splits a `[batch, heads, seq_len, head_dim]` call into `batch * heads`
//! independent units, runs the selected kernel on each, and writes every
//! unit's result into its own region of one output buffer. Regions are handed
//! out by `par_chunks_mut`, so no two units can touch the same memory.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::attention::{
    AttentionConfig, AttentionError, AttentionKernel, AttentionResult, HeadParams, KernelChoice,
    KernelRegistry, MechanismChoice, MechanismSelector,
};
use crate::config::OrchestratorConfig;
use crate::error::ForgeResult;
use crate::profiling::ScopedTimer;
use crate::tensor::{Tensor, TensorShape};

/// Shared flag for cooperative cancellation
///
/// Checked before each `(batch, head)` unit starts; a unit already running
/// finishes normally.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of one attention call
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionOutput {
    /// Same shape as the query
    pub output: Tensor,
    /// `[batch, heads, seq_len, seq_len]`, only from the reference kernel
    /// when `return_weights` was set
    pub weights: Option<Tensor>,
    /// Kernel that produced `output`
    pub kernel: KernelChoice,
    /// Tile size used, for the tiled kernel
    pub block_size: Option<usize>,
}

/// Runs attention calls over a worker pool
pub struct Orchestrator {
    config: OrchestratorConfig,
    selector: MechanismSelector,
    registry: KernelRegistry,
    pool: Option<rayon::ThreadPool>,
}

impl Orchestrator {
    /// Build from a validated config; creates a dedicated pool when
    /// `num_threads` is set
    pub fn new(config: OrchestratorConfig) -> ForgeResult<Self> {
        config.validate()?;

        let pool = match config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("attnforge-worker-{}", i))
                    .build()
                    .map_err(|e| AttentionError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };

        tracing::debug!(
            num_threads = ?config.num_threads,
            parallel = config.parallel,
            tiled_threshold = config.selector.tiled_threshold,
            linear_threshold = config.selector.linear_threshold,
            "Created attention orchestrator"
        );

        Ok(Self {
            selector: MechanismSelector::new(config.selector.clone()),
            config,
            registry: KernelRegistry::new(),
            pool,
        })
    }

    /// Default config on rayon's global pool
    pub fn with_defaults() -> Self {
        let config = OrchestratorConfig::default();
        Self {
            selector: MechanismSelector::new(config.selector.clone()),
            config,
            registry: KernelRegistry::new(),
            pool: None,
        }
    }

    /// Replace the kernel registry
    pub fn with_registry(mut self, registry: KernelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    /// Number of worker threads units are spread over
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Resolve kernel and dispatch mode for `config` without running anything
    pub fn select(&self, config: &AttentionConfig) -> MechanismChoice {
        let kernel = self.config.force_kernel.unwrap_or_else(|| {
            self.selector.select(
                config.seq_len,
                config.batch_size,
                Some(&self.config.resource_hint),
            )
        });
        let accelerated = self.config.parallel && config.num_units() > 1 && self.num_threads() > 1;
        MechanismChoice::new(kernel, accelerated)
    }

    /// Compute attention; see [`compute_with_cancel`](Self::compute_with_cancel)
    pub fn compute(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        config: &AttentionConfig,
    ) -> AttentionResult<AttentionOutput> {
        self.compute_with_cancel(query, key, value, config, &CancellationToken::new())
    }

    /// Compute attention, stopping between units once `token` is cancelled
    ///
    /// All shape and config errors are reported before any unit runs. A
    /// cancelled call returns [`AttentionError::Cancelled`] and no output.
    pub fn compute_with_cancel(
        &self,
        query: &Tensor,
        key: &Tensor,
        value: &Tensor,
        config: &AttentionConfig,
        token: &CancellationToken,
    ) -> AttentionResult<AttentionOutput> {
        config.validate()?;
        config.validate_inputs(query, key, value)?;

        let choice = self.select(config);
        let kernel = self.registry.get(choice.kernel);
        let block_size = self.config.block_heuristic.resolve(config);
        let want_weights = config.return_weights && kernel.supports_weights();

        let span = tracing::debug_span!(
            "attention",
            kernel = %choice.kernel,
            batch = config.batch_size,
            heads = config.num_heads,
            seq_len = config.seq_len,
            head_dim = config.head_dim,
        );
        let _enter = span.enter();
        let _timer = ScopedTimer::new(format!("attention::{}", choice.kernel));

        tracing::debug!(
            mechanism = choice.mechanism.as_str(),
            accelerated = choice.accelerated,
            block_size,
            causal = config.is_causal,
            return_weights = want_weights,
            "Dispatching attention units"
        );

        let total = config.num_units();
        if token.is_cancelled() {
            tracing::debug!(completed = 0, total, "Attention cancelled before dispatch");
            return Err(AttentionError::Cancelled {
                completed: 0,
                total,
            });
        }

        let weights_per_unit = config
            .seq_len
            .checked_mul(config.seq_len)
            .filter(|n| n.checked_mul(total).is_some())
            .ok_or_else(|| {
                AttentionError::InvalidShape(format!(
                    "attention weights for seq_len {} overflow usize",
                    config.seq_len
                ))
            });

        let mut output = vec![0.0f32; config.qkv_shape().numel()];
        let mut weights = if want_weights {
            Some(vec![0.0f32; weights_per_unit? * total])
        } else {
            None
        };

        let job = UnitJob {
            query,
            key,
            value,
            kernel,
            params: HeadParams {
                causal: config.is_causal,
                block_size,
            },
            num_heads: config.num_heads,
            total,
            completed: AtomicUsize::new(0),
            token,
        };
        let stride = config.head_stride();

        let dispatch = |output: &mut [f32], weights: Option<&mut [f32]>| {
            if choice.accelerated {
                job.run_parallel(output, weights, stride)
            } else {
                job.run_sequential(output, weights, stride)
            }
        };

        let result = match &self.pool {
            Some(pool) if choice.accelerated => {
                pool.install(|| dispatch(&mut output, weights.as_deref_mut()))
            }
            _ => dispatch(&mut output, weights.as_deref_mut()),
        };

        if let Err(err) = result {
            if let AttentionError::Cancelled { completed, total } = &err {
                tracing::debug!(completed, total, "Attention cancelled");
            }
            return Err(err);
        }

        let seq_len = config.seq_len;
        let output = Tensor::new(output, config.qkv_shape())?;
        let weights = match weights {
            Some(w) => Some(Tensor::new(
                w,
                TensorShape::attention(config.batch_size, config.num_heads, seq_len, seq_len),
            )?),
            None => None,
        };

        Ok(AttentionOutput {
            output,
            weights,
            kernel: choice.kernel,
            block_size: (choice.kernel == KernelChoice::Tiled).then_some(block_size),
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

/// Everything a unit needs, shared read-only across workers
struct UnitJob<'a> {
    query: &'a Tensor,
    key: &'a Tensor,
    value: &'a Tensor,
    kernel: &'a dyn AttentionKernel,
    params: HeadParams,
    num_heads: usize,
    total: usize,
    completed: AtomicUsize,
    token: &'a CancellationToken,
}

impl UnitJob<'_> {
    fn run_unit(&self, unit: usize, out: &mut [f32], weights: Option<&mut [f32]>) -> AttentionResult<()> {
        if self.token.is_cancelled() {
            return Err(AttentionError::Cancelled {
                completed: self.completed.load(Ordering::SeqCst),
                total: self.total,
            });
        }

        let (batch, head) = (unit / self.num_heads, unit % self.num_heads);
        tracing::trace!(batch, head, "Running attention unit");

        self.kernel.forward_head(
            self.query.head(batch, head)?,
            self.key.head(batch, head)?,
            self.value.head(batch, head)?,
            &self.params,
            out,
            weights,
        )?;

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn run_parallel(&self, output: &mut [f32], weights: Option<&mut [f32]>, stride: usize) -> AttentionResult<()> {
        match weights {
            Some(weights) => {
                let weight_stride = weights.len() / self.total;
                output
                    .par_chunks_mut(stride)
                    .zip(weights.par_chunks_mut(weight_stride))
                    .enumerate()
                    .try_for_each(|(unit, (out, w))| self.run_unit(unit, out, Some(w)))
            }
            None => output
                .par_chunks_mut(stride)
                .enumerate()
                .try_for_each(|(unit, out)| self.run_unit(unit, out, None)),
        }
    }

    fn run_sequential(&self, output: &mut [f32], weights: Option<&mut [f32]>, stride: usize) -> AttentionResult<()> {
        match weights {
            Some(weights) => {
                let weight_stride = weights.len() / self.total;
                output
                    .chunks_mut(stride)
                    .zip(weights.chunks_mut(weight_stride))
                    .enumerate()
                    .try_for_each(|(unit, (out, w))| self.run_unit(unit, out, Some(w)))
            }
            None => output
                .chunks_mut(stride)
                .enumerate()
                .try_for_each(|(unit, out)| self.run_unit(unit, out, None)),
        }
    }
}
