//! Orchestrator configuration
//!
//! [`OrchestratorConfig`] collects everything that stays fixed across
//! attention calls: worker pool size, selector thresholds, the block-size
//! heuristic and optional overrides. It can be built in code, loaded from a
//! JSON file, and overridden from `ATTNFORGE_*` environment variables.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attention::{BlockSizeHeuristic, KernelChoice, ResourceHint, SelectorConfig};

/// Worker thread count override
pub const ENV_NUM_THREADS: &str = "ATTNFORGE_NUM_THREADS";
/// Selector tiled threshold override
pub const ENV_TILED_THRESHOLD: &str = "ATTNFORGE_TILED_THRESHOLD";
/// Selector linear threshold override
pub const ENV_LINEAR_THRESHOLD: &str = "ATTNFORGE_LINEAR_THRESHOLD";
/// Block-size heuristic working set override
pub const ENV_WORKING_SET_BYTES: &str = "ATTNFORGE_WORKING_SET_BYTES";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    #[error("Config I/O error: {0}")]
    IoError(String),
    #[error("Config serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid value {value:?} for environment variable {name}")]
    EnvVar { name: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration of an [`Orchestrator`](crate::attention::Orchestrator)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Dedicated worker pool size; `None` uses rayon's global pool
    pub num_threads: Option<usize>,
    /// Dispatch `(batch, head)` units in parallel
    pub parallel: bool,
    pub selector: SelectorConfig,
    pub block_heuristic: BlockSizeHeuristic,
    /// Hint passed to the selector on every call
    pub resource_hint: ResourceHint,
    /// Bypass the selector
    pub force_kernel: Option<KernelChoice>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            num_threads: None,
            parallel: true,
            selector: SelectorConfig::default(),
            block_heuristic: BlockSizeHeuristic::default(),
            resource_hint: ResourceHint::default(),
            force_kernel: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_block_heuristic(mut self, block_heuristic: BlockSizeHeuristic) -> Self {
        self.block_heuristic = block_heuristic;
        self
    }

    pub fn with_resource_hint(mut self, resource_hint: ResourceHint) -> Self {
        self.resource_hint = resource_hint;
        self
    }

    pub fn with_force_kernel(mut self, kernel: KernelChoice) -> Self {
        self.force_kernel = Some(kernel);
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_threads == Some(0) {
            return Err(ConfigError::InvalidValue(
                "num_threads must be > 0".to_string(),
            ));
        }
        self.selector.validate()?;
        self.block_heuristic
            .validate()
            .map_err(ConfigError::InvalidValue)?;
        Ok(())
    }

    /// Parse from a JSON string; missing fields take their defaults
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::SerializationError(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let mut file = std::fs::File::open(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to open config file: {}", e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_json_str(&contents)
    }

    /// Write as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        let mut file =
            std::fs::File::create(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        file.write_all(json.as_bytes())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Defaults overridden from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `ATTNFORGE_*` overrides from the process environment
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = parse_usize_var(&lookup, ENV_NUM_THREADS)? {
            self.num_threads = Some(n);
        }
        if let Some(n) = parse_usize_var(&lookup, ENV_TILED_THRESHOLD)? {
            self.selector.tiled_threshold = n;
        }
        if let Some(n) = parse_usize_var(&lookup, ENV_LINEAR_THRESHOLD)? {
            self.selector.linear_threshold = n;
        }
        if let Some(n) = parse_usize_var(&lookup, ENV_WORKING_SET_BYTES)? {
            self.block_heuristic.working_set_bytes = n;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_usize_var<F>(lookup: &F, name: &str) -> ConfigResult<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVar {
                name: name.to_string(),
                value: raw,
            }),
    }
}
