//! In-memory audit ledger for testing.

use crate::audit::{
    domain::{AuditEntry, AuditQuery},
    ports::{AuditError, AuditLedger, AuditResult},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLedger {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every entry in append order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Persistence`] when the ledger lock is poisoned.
    pub fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| AuditError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(entries.clone())
    }
}

#[async_trait]
impl AuditLedger for InMemoryAuditLedger {
    async fn append(&self, entry: AuditEntry) -> AuditResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| AuditError::persistence(std::io::Error::other(err.to_string())))?;
        entries.push(entry);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> AuditResult<Vec<AuditEntry>> {
        Ok(query.select(self.entries()?))
    }
}
