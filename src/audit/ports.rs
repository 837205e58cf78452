//! Audit ledger port.

use super::domain::{AuditEntry, AuditQuery};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for ledger operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Append-only record of board mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLedger: Send + Sync {
    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the entry cannot be encoded or written.
    async fn append(&self, entry: AuditEntry) -> AuditResult<()>;

    /// Returns matching entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the ledger cannot be read.
    async fn query(&self, query: &AuditQuery) -> AuditResult<Vec<AuditEntry>>;
}

/// Errors returned by ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditError {
    /// An entry could not be encoded.
    #[error("failed to encode audit entry: {0}")]
    Encode(Arc<serde_json::Error>),

    /// The ledger file could not be read or appended to.
    #[error("audit ledger i/o failure: {0}")]
    Io(Arc<std::io::Error>),

    /// Any other persistence-layer failure.
    #[error("audit persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditError {
    /// Wraps an I/O failure.
    #[must_use]
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(Arc::new(err))
    }
}
