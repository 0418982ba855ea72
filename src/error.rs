//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its registry.
///
/// Cloneable so a single producer failure can be handed to every caller
/// waiting on the same production.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The producer failed for a key
    #[error("Producer failed for key '{key}': {error:#}")]
    Producer {
        key: String,
        error: Arc<anyhow::Error>,
    },

    /// No cache registered under the given name
    #[error("Cache not found: {0}")]
    NotFound(String),

    /// A cache is registered under the name but holds another value type
    #[error("Cache '{name}' does not hold values of type {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// The completion handle was dropped before an outcome was delivered
    #[error("Production abandoned for key: {0}")]
    Abandoned(String),
}

impl CacheError {
    /// Returns true if this error came from the producer function.
    pub fn is_producer_failure(&self) -> bool {
        matches!(self, CacheError::Producer { .. })
    }

    /// Returns the underlying producer error, if any.
    pub fn producer_error(&self) -> Option<&anyhow::Error> {
        match self {
            CacheError::Producer { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_error_display_includes_key_and_cause() {
        let err = CacheError::Producer {
            key: "user:1".to_string(),
            error: Arc::new(anyhow::anyhow!("connection refused")),
        };

        let msg = err.to_string();
        assert!(msg.contains("user:1"));
        assert!(msg.contains("connection refused"));
        assert!(err.is_producer_failure());
        assert_eq!(
            err.producer_error().map(|e| e.to_string()),
            Some("connection refused".to_string())
        );
    }

    #[test]
    fn test_clone_shares_producer_error() {
        let err = CacheError::Producer {
            key: "k".to_string(),
            error: Arc::new(anyhow::anyhow!("boom")),
        };
        let cloned = err.clone();

        match (&err, &cloned) {
            (
                CacheError::Producer { error: a, .. },
                CacheError::Producer { error: b, .. },
            ) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected producer errors"),
        }
    }

    #[test]
    fn test_non_producer_errors() {
        let not_found = CacheError::NotFound("user".to_string());
        assert!(!not_found.is_producer_failure());
        assert!(not_found.producer_error().is_none());
        assert_eq!(not_found.to_string(), "Cache not found: user");

        let mismatch = CacheError::TypeMismatch {
            name: "user".to_string(),
            expected: "u32",
        };
        assert!(mismatch.to_string().contains("u32"));
    }
}
