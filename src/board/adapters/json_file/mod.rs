//! File-backed board store.
//!
//! Each collection lives in one pretty-printed JSON array under the data
//! directory. Writers to a collection queue on that collection's mutex and
//! perform a full read-modify-write while holding it. Files are replaced by
//! renaming a synced temporary file over them, so lock-free readers only
//! ever see a complete document.

mod backup;

use super::collection::{CollectionMap, Mutation, RecordSet};
use crate::board::domain::{NewComment, Task, TaskId};
use crate::board::ports::{Collection, Record, RecordStore, StoreError, StoreResult, TaskStore};
use crate::config::BoardConfig;
use async_trait::async_trait;
use backup::BackupRotation;
use camino::{Utf8Path, Utf8PathBuf};
use mockable::Clock;
use std::io;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const EMPTY_COLLECTION: &[u8] = b"[]\n";

/// Board store persisting each collection as a JSON file.
#[derive(Debug)]
pub struct JsonFileStore<C>
where
    C: Clock + Send + Sync,
{
    data_dir: Utf8PathBuf,
    locks: CollectionMap<Mutex<()>>,
    backups: BackupRotation,
    clock: Arc<C>,
}

impl<C> JsonFileStore<C>
where
    C: Clock + Send + Sync,
{
    /// Opens a store rooted at the configured data directory, creating the
    /// directory and its backup subdirectory when absent.
    ///
    /// Collection files are created lazily on first access.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the directories cannot be
    /// created.
    pub async fn open(config: &BoardConfig, clock: Arc<C>) -> StoreResult<Self> {
        let backups = BackupRotation::new(config.backup_dir(), config.backup_retention());
        fs::create_dir_all(backups.dir())
            .await
            .map_err(StoreError::persistence)?;
        debug!(data_dir = %config.data_dir(), "opened file store");

        Ok(Self {
            data_dir: config.data_dir().to_owned(),
            locks: CollectionMap::from_fn(|_| Mutex::new(())),
            backups,
            clock,
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// Returns the path of the file backing `collection`.
    #[must_use]
    pub fn collection_path(&self, collection: Collection) -> Utf8PathBuf {
        self.data_dir.join(collection.file_name())
    }

    /// Lists the backups currently kept for `collection`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the backup directory cannot be read.
    pub async fn backups(&self, collection: Collection) -> StoreResult<Vec<Utf8PathBuf>> {
        self.backups
            .list(collection)
            .await
            .map_err(|err| StoreError::io(collection, err))
    }

    async fn read_collection<R: Record>(&self) -> StoreResult<RecordSet<R>> {
        let path = self.collection_path(R::COLLECTION);
        match fs::read(&path).await {
            Ok(bytes) => RecordSet::parse(&bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.initialize(R::COLLECTION).await?;
                Ok(RecordSet::default())
            }
            Err(err) => Err(StoreError::io(R::COLLECTION, err)),
        }
    }

    async fn initialize(&self, collection: Collection) -> StoreResult<()> {
        let _guard = self.locks.get(collection).lock().await;
        let path = self.collection_path(collection);
        let exists = fs::try_exists(&path)
            .await
            .map_err(|err| StoreError::io(collection, err))?;
        if !exists {
            write_atomically(&path, EMPTY_COLLECTION)
                .await
                .map_err(|err| StoreError::io(collection, err))?;
            debug!(%collection, "initialized empty collection");
        }
        Ok(())
    }

    async fn write_collection<R, T, F>(&self, mutate: F) -> StoreResult<T>
    where
        R: Record,
        F: FnOnce(&mut RecordSet<R>) -> StoreResult<Mutation<T>> + Send,
    {
        let collection = R::COLLECTION;
        let _guard = self.locks.get(collection).lock().await;
        let path = self.collection_path(collection);

        let (mut records, existed) = match fs::read(&path).await {
            Ok(bytes) => (RecordSet::parse(&bytes)?, true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => (RecordSet::default(), false),
            Err(err) => return Err(StoreError::io(collection, err)),
        };

        let value = match mutate(&mut records)? {
            Mutation::Unchanged(value) => return Ok(value),
            Mutation::Changed(value) => value,
        };

        let document = records.render()?;
        if existed {
            self.backups
                .snapshot(collection, &path, self.clock.utc())
                .await
                .map_err(|err| StoreError::io(collection, err))?;
        }
        write_atomically(&path, &document)
            .await
            .map_err(|err| StoreError::io(collection, err))?;
        debug!(%collection, bytes = document.len(), "collection written");
        Ok(value)
    }
}

#[async_trait]
impl<R, C> RecordStore<R> for JsonFileStore<C>
where
    R: Record,
    C: Clock + Send + Sync,
{
    async fn list(&self, filter: &R::Filter) -> StoreResult<Vec<R>> {
        Ok(self.read_collection::<R>().await?.into_matching(filter))
    }

    async fn get(&self, id: &str) -> StoreResult<Option<R>> {
        Ok(self.read_collection::<R>().await?.find(id))
    }

    async fn create(&self, record: R) -> StoreResult<R> {
        self.write_collection(|records: &mut RecordSet<R>| {
            records.insert(record).map(Mutation::Changed)
        })
        .await
    }

    async fn update(&self, id: &str, patch: R::Patch) -> StoreResult<Option<R>> {
        let clock = &self.clock;
        self.write_collection(|records: &mut RecordSet<R>| {
            Ok(records.update(id, patch, clock.utc()))
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.write_collection(|records: &mut RecordSet<R>| Ok(records.remove(id)))
            .await
    }

    async fn delete_matching(&self, filter: &R::Filter) -> StoreResult<usize> {
        self.write_collection(|records: &mut RecordSet<R>| Ok(records.remove_matching(filter)))
            .await
    }
}

#[async_trait]
impl<C> TaskStore for JsonFileStore<C>
where
    C: Clock + Send + Sync,
{
    async fn append_comment(
        &self,
        task_id: &TaskId,
        comment: NewComment,
    ) -> StoreResult<Option<Task>> {
        let clock = &self.clock;
        self.write_collection(|records: &mut RecordSet<Task>| {
            Ok(records.modify(task_id.as_str(), |task| {
                task.push_comment(comment.recorded_at(clock.utc()));
            }))
        })
        .await
    }
}

/// Replaces `path` with `contents` via a synced sibling temporary file.
async fn write_atomically(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} has no file name")))?;
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    let written = match write_synced(&temp_path, contents).await {
        Ok(()) => fs::rename(&temp_path, path).await,
        Err(err) => Err(err),
    };
    if written.is_err() {
        match fs::remove_file(&temp_path).await {
            Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                warn!(path = %temp_path, error = %cleanup, "failed to remove temporary file");
            }
            _ => {}
        }
    }
    written
}

async fn write_synced(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}
