//! In-memory board store for testing.
//!
//! Collections are held as serialized documents so records go through the
//! same JSON round trip as the file store.

use super::collection::{CollectionMap, Mutation, RecordSet};
use crate::board::domain::{NewComment, Task, TaskId};
use crate::board::ports::{Record, RecordStore, StoreResult, TaskStore};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe in-memory board store.
pub struct InMemoryBoardStore<C>
where
    C: Clock + Send + Sync,
{
    documents: CollectionMap<Mutex<Vec<u8>>>,
    clock: Arc<C>,
}

impl<C> InMemoryBoardStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            documents: CollectionMap::from_fn(|_| Mutex::new(b"[]".to_vec())),
            clock,
        }
    }

    async fn read_collection<R: Record>(&self) -> StoreResult<RecordSet<R>> {
        let document = self.documents.get(R::COLLECTION).lock().await;
        RecordSet::parse(&document)
    }

    async fn write_collection<R, T, F>(&self, mutate: F) -> StoreResult<T>
    where
        R: Record,
        F: FnOnce(&mut RecordSet<R>) -> StoreResult<Mutation<T>> + Send,
    {
        let mut document = self.documents.get(R::COLLECTION).lock().await;
        let mut records = RecordSet::parse(&document)?;
        match mutate(&mut records)? {
            Mutation::Unchanged(value) => Ok(value),
            Mutation::Changed(value) => {
                *document = records.render()?;
                Ok(value)
            }
        }
    }
}

#[async_trait]
impl<R, C> RecordStore<R> for InMemoryBoardStore<C>
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
impl<C> TaskStore for InMemoryBoardStore<C>
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
