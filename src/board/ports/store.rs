//! Store port for board collections.
//!
//! The board keeps three collections (projects, tasks, agents). Every
//! collection supports the same CRUD contract; tasks additionally accept
//! comments. Writers to one collection are serialized, writers to different
//! collections never contend.

use crate::board::domain::{
    Agent, AgentFilter, AgentPatch, NewComment, Project, ProjectFilter, ProjectPatch, Task,
    TaskFilter, TaskId, TaskPatch,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A named entity collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Projects.
    Projects,
    /// Tasks.
    Tasks,
    /// Agents.
    Agents,
}

impl Collection {
    /// Returns the collection name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Agents => "agents",
        }
    }

    /// Returns the name of the file backing the collection.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Projects => "projects.json",
            Self::Tasks => "tasks.json",
            Self::Agents => "agents.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity that lives in one of the board collections.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection holding records of this type.
    const COLLECTION: Collection;

    /// Whether `create` replaces an existing record with the same id instead
    /// of rejecting it.
    const UPSERT_ON_CREATE: bool = false;

    /// Field-level update payload.
    type Patch: Send + 'static;

    /// Listing filter.
    type Filter: Send + Sync;

    /// Returns the record identifier.
    fn record_id(&self) -> &str;

    /// Merges `patch` into the record, bumping its modification time.
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    /// Returns `true` when the record satisfies `filter`.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Drops any reference to a deleted record of the same collection.
    ///
    /// Returns `true` when the record changed.
    fn forget(&mut self, _deleted_id: &str) -> bool {
        false
    }
}

impl Record for Project {
    const COLLECTION: Collection = Collection::Projects;
    type Patch = ProjectPatch;
    type Filter = ProjectFilter;

    fn record_id(&self) -> &str {
        self.id().as_str()
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) {
        self.apply_patch(patch, now);
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter.matches(self)
    }
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;
    type Patch = TaskPatch;
    type Filter = TaskFilter;

    fn record_id(&self) -> &str {
        self.id().as_str()
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) {
        self.apply_patch(patch, now);
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter.matches(self)
    }

    fn forget(&mut self, deleted_id: &str) -> bool {
        self.remove_dependency(deleted_id)
    }
}

impl Record for Agent {
    const COLLECTION: Collection = Collection::Agents;
    const UPSERT_ON_CREATE: bool = true;
    type Patch = AgentPatch;
    type Filter = AgentFilter;

    fn record_id(&self) -> &str {
        self.id().as_str()
    }

    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) {
        self.apply_patch(patch, now);
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter.matches(self)
    }
}

/// CRUD contract shared by every collection.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Returns the records matching `filter`, in insertion order.
    ///
    /// Reads take no lock and observe the last fully written state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] when the collection cannot be parsed,
    /// or [`StoreError::Io`] when it cannot be read.
    async fn list(&self, filter: &R::Filter) -> StoreResult<Vec<R>>;

    /// Finds a record by identifier.
    ///
    /// Returns `None` when the record does not exist.
    async fn get(&self, id: &str) -> StoreResult<Option<R>>;

    /// Appends a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the identifier is taken and the
    /// collection does not upsert on create.
    async fn create(&self, record: R) -> StoreResult<R>;

    /// Merges `patch` into the stored record.
    ///
    /// Returns `None` when the record does not exist.
    async fn update(&self, id: &str, patch: R::Patch) -> StoreResult<Option<R>>;

    /// Removes a record, returning whether it existed.
    ///
    /// Other records of the same collection drop their references to it in
    /// the same write.
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Removes every record matching `filter` in a single write, returning
    /// how many were removed.
    ///
    /// Remaining records drop their references to the removed ones in the
    /// same write.
    async fn delete_matching(&self, filter: &R::Filter) -> StoreResult<usize>;
}

/// Task collection contract.
#[async_trait]
pub trait TaskStore: RecordStore<Task> {
    /// Appends a comment stamped with the store's clock.
    ///
    /// Returns `None` when the task does not exist.
    async fn append_comment(&self, task_id: &TaskId, comment: NewComment)
    -> StoreResult<Option<Task>>;
}

/// A store holding every board collection.
pub trait BoardStore: TaskStore + RecordStore<Project> + RecordStore<Agent> {}

impl<S> BoardStore for S where S: TaskStore + RecordStore<Project> + RecordStore<Agent> {}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The stored collection could not be parsed. The store does not repair
    /// corrupt collections.
    #[error("{collection} collection is corrupt: {source}")]
    Corrupt {
        /// Affected collection.
        collection: Collection,
        /// Parse failure.
        source: Arc<serde_json::Error>,
    },

    /// A record with the same identifier already exists.
    #[error("duplicate {collection} identifier: {id}")]
    Duplicate {
        /// Affected collection.
        collection: Collection,
        /// Conflicting identifier.
        id: String,
    },

    /// Reading or writing the collection failed.
    #[error("i/o failure on {collection}: {source}")]
    Io {
        /// Affected collection.
        collection: Collection,
        /// Underlying failure.
        source: Arc<std::io::Error>,
    },

    /// Any other persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a parse failure for `collection`.
    #[must_use]
    pub fn corrupt(collection: Collection, err: serde_json::Error) -> Self {
        Self::Corrupt {
            collection,
            source: Arc::new(err),
        }
    }

    /// Wraps an I/O failure for `collection`.
    #[must_use]
    pub fn io(collection: Collection, err: std::io::Error) -> Self {
        Self::Io {
            collection,
            source: Arc::new(err),
        }
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
