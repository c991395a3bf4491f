//! Error types for the entity persistence core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! The taxonomy matters to callers: on any error they roll back, but only
//! [`Error::Backend`] failures are plausibly transient and worth retrying.
//! Retry policy itself belongs to a layer above this core; nothing here
//! retries.

use thiserror::Error;

/// Result type alias for plinth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the entity persistence core
#[derive(Debug, Error)]
pub enum Error {
    /// The request is malformed before any query is issued
    /// (e.g. creating a non-concrete record in production)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Transaction-manager misuse: double-begin, commit/rollback while idle,
    /// or a state change attempted with no transaction and no unsafe mode
    #[error("transaction protocol violation: {0}")]
    Protocol(String),

    /// A lifecycle conflict: the entity's current state forbids the
    /// operation (archive of an archived entity, purge of a live one)
    #[error("{operation} conflict on {table}: {reason}")]
    Conflict {
        /// The state operation that was refused
        operation: &'static str,
        /// Table the operation targets
        table: &'static str,
        /// What made the entity's state incompatible
        reason: String,
    },

    /// A single-entity state query affected more than one row
    ///
    /// This signals a missing or malformed predicate. It is always fatal,
    /// never retried, and always surfaced; the caller's transaction is
    /// responsible for rolling back any partial effects.
    #[error("unexpected multi-row {operation} on {table}: {rows_affected} rows affected")]
    Integrity {
        /// The state operation that went wide
        operation: &'static str,
        /// Table the operation targets
        table: &'static str,
        /// How many rows were actually affected
        rows_affected: u64,
    },

    /// The underlying storage call failed (connection loss, constraint
    /// violation, etc.)
    #[error("error attempting {operation} on {table}")]
    Backend {
        /// The operation being attempted
        operation: &'static str,
        /// Table the operation targets
        table: &'static str,
        /// The backend's own failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A required single-row retrieval returned zero rows
    ///
    /// Optional retrievals returning zero rows are not errors; this variant
    /// is reserved for retrievals the caller declared mandatory.
    #[error("no {table} record matched a required retrieval")]
    NotFound {
        /// Table the retrieval targeted
        table: &'static str,
    },

    /// Backend-internal fault (reference backend's own error category)
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Wrap a backend failure with operation/table context
    pub fn backend(
        operation: &'static str,
        table: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Backend {
            operation,
            table,
            source: Box::new(source),
        }
    }

    /// Build a lifecycle conflict error
    pub fn conflict(
        operation: &'static str,
        table: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Error::Conflict {
            operation,
            table,
            reason: reason.into(),
        }
    }

    /// Whether a retry at a higher layer could plausibly succeed
    ///
    /// Only backend faults qualify; everything else is deterministic misuse
    /// or a data-integrity signal that must not be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Backend { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("non-concrete entity".to_string());
        assert!(err.to_string().contains("invalid request"));
        assert!(err.to_string().contains("non-concrete entity"));
    }

    #[test]
    fn test_error_display_protocol() {
        let err = Error::Protocol("transaction already active".to_string());
        let msg = err.to_string();
        assert!(msg.contains("protocol violation"));
        assert!(msg.contains("transaction already active"));
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::conflict("archive", "entities", "entity is already archived");
        let msg = err.to_string();
        assert!(msg.contains("archive conflict on entities"));
        assert!(msg.contains("already archived"));
    }

    #[test]
    fn test_error_display_integrity() {
        let err = Error::Integrity {
            operation: "update",
            table: "entities",
            rows_affected: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("multi-row update"));
        assert!(msg.contains("entities"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn test_error_backend_preserves_source() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "lost connection");
        let err = Error::backend("create", "entities", source);
        assert!(err.to_string().contains("create"));

        // The underlying failure stays reachable through the source chain.
        let source = std::error::Error::source(&err).expect("backend error has a source");
        assert!(source.to_string().contains("lost connection"));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound { table: "entities" };
        assert!(err.to_string().contains("entities"));
        assert!(err.to_string().contains("required retrieval"));
    }

    #[test]
    fn test_only_backend_errors_are_retryable() {
        let backend = Error::backend(
            "update",
            "entities",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"),
        );
        assert!(backend.is_retryable());

        assert!(!Error::Validation("x".into()).is_retryable());
        assert!(!Error::Protocol("x".into()).is_retryable());
        assert!(!Error::conflict("purge", "entities", "not archived").is_retryable());
        assert!(!Error::Integrity {
            operation: "archive",
            table: "entities",
            rows_affected: 3
        }
        .is_retryable());
        assert!(!Error::NotFound { table: "entities" }.is_retryable());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
