//! Unified error handling for attnforge
//!
//! Each concern keeps its own `thiserror` enum ([`AttentionError`],
//! [`ConfigError`], [`LoggingError`]); [`AttnForgeError`] wraps them for
//! callers that want one error type, and sorts them into categories:
//! - User errors (bad shapes, bad block sizes, unknown mechanism names)
//! - Config errors (invalid files, values or environment overrides)
//! - Cancelled (cooperative cancellation was observed)
//! - Internal errors (worker pool failures)

use std::fmt;

use crate::attention::AttentionError;
use crate::catalog::UnknownMechanism;
use crate::config::ConfigError;
use crate::logging::LoggingError;

/// Unified error type for attnforge
#[derive(Debug, thiserror::Error)]
pub enum AttnForgeError {
    #[error(transparent)]
    Attention(#[from] AttentionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    UnknownMechanism(#[from] UnknownMechanism),
}

impl AttnForgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AttnForgeError::Attention(AttentionError::InvalidShape(_))
            | AttnForgeError::Attention(AttentionError::InvalidBlockSize(_))
            | AttnForgeError::UnknownMechanism(_) => ErrorCategory::User,

            AttnForgeError::Attention(AttentionError::Cancelled { .. }) => ErrorCategory::Cancelled,

            AttnForgeError::Config(_) | AttnForgeError::Logging(_) => ErrorCategory::Config,

            AttnForgeError::Attention(AttentionError::ThreadPool(_)) => ErrorCategory::Internal,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::User)
    }

    pub fn is_internal_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Internal)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.category(), ErrorCategory::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    User,
    Config,
    Cancelled,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::User => write!(f, "User"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Cancelled => write!(f, "Cancelled"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

pub type ForgeResult<T> = std::result::Result<T, AttnForgeError>;
