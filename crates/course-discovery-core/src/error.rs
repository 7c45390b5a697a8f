//! Error taxonomy for the discovery pipeline.
//!
//! Provider, store, and cache failures are environmental: components
//! recover from them locally and log them. Validation and not-found
//! errors are surfaced to callers as 4xx. `Internal` marks a logic defect
//! (for example a non-finite score) and is always surfaced as a 500.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("primary store error: {0}")]
    Store(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DiscoveryError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            DiscoveryError::Provider { .. } => "E_PROVIDER",
            DiscoveryError::Store(_) => "E_STORE",
            DiscoveryError::Cache(_) => "E_CACHE",
            DiscoveryError::Validation(_) => "E_VALIDATION",
            DiscoveryError::NotFound(_) => "E_NOT_FOUND",
            DiscoveryError::Internal(_) => "E_INTERNAL",
        }
    }

    /// Whether the error is recovered locally rather than shown to users.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Provider { .. } | DiscoveryError::Store(_) | DiscoveryError::Cache(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiscoveryError::Validation("q".into()).code(), "E_VALIDATION");
        assert_eq!(DiscoveryError::Internal("x".into()).code(), "E_INTERNAL");
        assert_eq!(DiscoveryError::NotFound("x".into()).code(), "E_NOT_FOUND");
    }

    #[test]
    fn test_environmental_errors_are_recoverable() {
        let err = DiscoveryError::Provider {
            provider: "edx".into(),
            message: "timeout".into(),
        };
        assert!(err.is_recoverable());
        assert!(DiscoveryError::Cache("read".into()).is_recoverable());
        assert!(!DiscoveryError::Internal("nan".into()).is_recoverable());
    }
}
