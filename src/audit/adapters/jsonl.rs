//! JSON Lines audit ledger.

use crate::audit::{
    domain::{AuditEntry, AuditQuery},
    ports::{AuditError, AuditLedger, AuditResult},
};
use crate::config::BoardConfig;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::OpenOptions;
use std::io::{self, Write};
use tokio::fs;
use tracing::warn;

/// Ledger storing one JSON object per line.
///
/// Appends open the file in append mode and hand each entry to one blocking
/// `write_all` on the pool, so concurrent appends never interleave within a
/// line and never wait on a lock. Queries read the whole file.
#[derive(Debug, Clone)]
pub struct JsonlAuditLedger {
    path: Utf8PathBuf,
}

impl JsonlAuditLedger {
    /// Opens the ledger at `location`, creating its parent directory when absent.
    ///
    /// The file itself is created on the first append.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the parent directory cannot be created.
    pub async fn open(location: impl Into<Utf8PathBuf>) -> AuditResult<Self> {
        let path = location.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(AuditError::io)?;
        }
        Ok(Self { path })
    }

    /// Opens the ledger at the configured location.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the data directory cannot be created.
    pub async fn from_config(config: &BoardConfig) -> AuditResult<Self> {
        Self::open(config.ledger_path()).await
    }

    /// Returns the ledger file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

#[async_trait]
impl AuditLedger for JsonlAuditLedger {
    async fn append(&self, entry: AuditEntry) -> AuditResult<()> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(AuditError::persistence)?
            .map_err(AuditError::io)
    }

    async fn query(&self, query: &AuditQuery) -> AuditResult<Vec<AuditEntry>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(AuditError::io(err)),
        };

        let entries = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(
                        ledger = %self.path,
                        line = index + 1,
                        error = %err,
                        "skipping malformed audit line"
                    );
                    None
                }
            })
            .collect();
        Ok(query.select(entries))
    }
}

fn append_line(path: &Utf8Path, line: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line)
}
