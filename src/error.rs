//! Unified error handling for slircbot.
//!
//! This module provides the error hierarchy for module management. Nothing
//! here ever crashes the dispatch loop: load/unload callers decide what a
//! failure means, and per-hook callback failures are captured separately as
//! [`HookFailure`](crate::bot::HookFailure) records.

use thiserror::Error;

// ============================================================================
// Module Management Errors
// ============================================================================

/// Errors surfaced by module load/unload and service lookups.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BotError {
    #[error("module `{0}` is already loaded")]
    DuplicateModule(String),

    #[error("module `{0}` is not loaded")]
    UnknownModule(String),

    #[error("no built-in module kind `{0}`")]
    UnknownModuleKind(String),

    /// The constructor failed; no hooks were registered and no record was
    /// added.
    #[error("module `{name}` failed to initialize")]
    ModuleInit {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A constructor required a service no loaded module provides.
    #[error("no loaded module provides service `{0}`")]
    MissingService(String),
}

impl BotError {
    /// Short label for logging and metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateModule(_) => "duplicate_module",
            Self::UnknownModule(_) => "unknown_module",
            Self::UnknownModuleKind(_) => "unknown_module_kind",
            Self::ModuleInit { .. } => "module_init",
            Self::MissingService(_) => "missing_service",
        }
    }
}

/// Result type for module-management operations.
pub type BotResult<T> = Result<T, BotError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BotError::DuplicateModule("seen".to_string()).to_string(),
            "module `seen` is already loaded"
        );
        assert_eq!(
            BotError::MissingService("kvstore".to_string()).to_string(),
            "no loaded module provides service `kvstore`"
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            BotError::UnknownModule("x".to_string()).error_code(),
            "unknown_module"
        );
        assert_eq!(
            BotError::UnknownModuleKind("x".to_string()).error_code(),
            "unknown_module_kind"
        );
    }

    #[test]
    fn test_module_init_keeps_cause() {
        let err = BotError::ModuleInit {
            name: "seen".to_string(),
            source: anyhow::anyhow!("kvstore unavailable"),
        };
        let cause = err.source().expect("cause present");
        assert!(cause.to_string().contains("kvstore"));
    }
}
