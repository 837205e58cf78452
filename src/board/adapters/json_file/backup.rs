//! Rotating snapshots of collection files.

use crate::board::ports::Collection;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

const BACKUP_EXTENSION: &str = ".json";
const SEQUENCE_MODULUS: u64 = 1_000_000;

/// Copies collection files aside before they are overwritten and keeps the
/// newest `retention` copies per collection.
///
/// Snapshot names are `<collection>-<YYYYMMDDTHHMMSSffffff>Z-<seq>.json`.
/// The timestamp and sequence are fixed width, so lexicographic order is
/// creation order.
#[derive(Debug)]
pub(crate) struct BackupRotation {
    dir: Utf8PathBuf,
    retention: usize,
    sequence: AtomicU64,
}

impl BackupRotation {
    pub(crate) const fn new(dir: Utf8PathBuf, retention: usize) -> Self {
        Self {
            dir,
            retention,
            sequence: AtomicU64::new(0),
        }
    }

    pub(crate) fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Copies `source` into the backup directory, then prunes old snapshots
    /// of the same collection.
    pub(crate) async fn snapshot(
        &self,
        collection: Collection,
        source: &Utf8Path,
        now: DateTime<Utc>,
    ) -> io::Result<Utf8PathBuf> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) % SEQUENCE_MODULUS;
        let target = self.dir.join(format!(
            "{}-{}-{sequence:06}{BACKUP_EXTENSION}",
            collection.as_str(),
            now.format("%Y%m%dT%H%M%S%6fZ"),
        ));
        fs::copy(source, &target).await?;
        let pruned = self.prune(collection).await?;
        debug!(%collection, backup = %target, pruned, "snapshot taken");
        Ok(target)
    }

    /// Lists the snapshots of `collection`, oldest first.
    pub(crate) async fn list(&self, collection: Collection) -> io::Result<Vec<Utf8PathBuf>> {
        let prefix = format!("{}-", collection.as_str());
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut names: Vec<String> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(&prefix) && name.ends_with(BACKUP_EXTENSION) {
                names.push(name);
            }
        }
        names.sort_unstable();
        Ok(names.into_iter().map(|name| self.dir.join(name)).collect())
    }

    async fn prune(&self, collection: Collection) -> io::Result<usize> {
        let snapshots = self.list(collection).await?;
        let excess = snapshots.len().saturating_sub(self.retention);
        for path in snapshots.iter().take(excess) {
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(excess)
    }
}
