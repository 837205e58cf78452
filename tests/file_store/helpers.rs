//! Shared helpers for file store integration tests.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use taskboard::board::{
    adapters::json_file::JsonFileStore,
    domain::{NewTask, Task},
    ports::RecordStore,
};
use taskboard::config::BoardConfig;
use tempfile::TempDir;

/// File store type used by the tests.
pub type TestFileStore = JsonFileStore<DefaultClock>;

/// A store rooted in a temporary data directory.
pub struct FileBoard {
    /// Keeps the data directory alive.
    pub dir: TempDir,
    /// Configuration the store was opened with.
    pub config: BoardConfig,
    /// The store under test.
    pub store: Arc<TestFileStore>,
}

impl FileBoard {
    /// Opens a store in a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or store cannot be created.
    pub async fn open(backup_retention: usize) -> eyre::Result<Self> {
        let dir = TempDir::new()?;
        let data_dir = Utf8PathBuf::try_from(dir.path().join("data"))?;
        let config = BoardConfig::default()
            .with_data_dir(data_dir)
            .with_backup_retention(backup_retention);
        let store = Arc::new(JsonFileStore::open(&config, Arc::new(DefaultClock)).await?);
        Ok(Self { dir, config, store })
    }

    /// Opens a second store over the same data directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be opened.
    pub async fn reopen(&self) -> eyre::Result<TestFileStore> {
        Ok(JsonFileStore::open(&self.config, Arc::new(DefaultClock)).await?)
    }

    /// Creates a task titled `title` in project `p`.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is invalid or cannot be stored.
    pub async fn add_task(&self, title: &str) -> eyre::Result<Task> {
        let task = Task::new(NewTask::new("p", title), &DefaultClock)?;
        Ok(RecordStore::<Task>::create(&*self.store, task).await?)
    }
}
