//! Collection contents and mutation rules shared by the store adapters.

use crate::board::ports::{Collection, Record, StoreError, StoreResult};
use chrono::{DateTime, Utc};

/// Value held for every collection, looked up by [`Collection`].
#[derive(Debug, Default)]
pub(crate) struct CollectionMap<T> {
    projects: T,
    tasks: T,
    agents: T,
}

impl<T> CollectionMap<T> {
    /// Builds the map by calling `init` once per collection.
    pub(crate) fn from_fn(mut init: impl FnMut(Collection) -> T) -> Self {
        Self {
            projects: init(Collection::Projects),
            tasks: init(Collection::Tasks),
            agents: init(Collection::Agents),
        }
    }

    /// Returns the value held for `collection`.
    pub(crate) const fn get(&self, collection: Collection) -> &T {
        match collection {
            Collection::Projects => &self.projects,
            Collection::Tasks => &self.tasks,
            Collection::Agents => &self.agents,
        }
    }
}

/// Outcome of a mutation against a loaded collection.
pub(crate) enum Mutation<T> {
    /// The collection changed and must be written back.
    Changed(T),
    /// Nothing changed; no write is needed.
    Unchanged(T),
}

/// Full contents of one collection, in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct RecordSet<R> {
    records: Vec<R>,
}

impl<R> Default for RecordSet<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Record> RecordSet<R> {
    /// Parses a stored collection document.
    pub(crate) fn parse(bytes: &[u8]) -> StoreResult<Self> {
        let records = serde_json::from_slice(bytes)
            .map_err(|err| StoreError::corrupt(R::COLLECTION, err))?;
        Ok(Self { records })
    }

    /// Renders the collection document written to storage.
    pub(crate) fn render(&self) -> StoreResult<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec_pretty(&self.records).map_err(StoreError::persistence)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Returns the records matching `filter`.
    pub(crate) fn into_matching(self, filter: &R::Filter) -> Vec<R> {
        self.records
            .into_iter()
            .filter(|record| record.matches(filter))
            .collect()
    }

    /// Returns a copy of the record with identifier `id`.
    pub(crate) fn find(&self, id: &str) -> Option<R> {
        self.records
            .iter()
            .find(|record| record.record_id() == id)
            .cloned()
    }

    /// Appends `record`, or replaces a same-id record for upserting
    /// collections.
    pub(crate) fn insert(&mut self, record: R) -> StoreResult<R> {
        let existing = self
            .records
            .iter_mut()
            .find(|stored| stored.record_id() == record.record_id());
        match existing {
            Some(stored) if R::UPSERT_ON_CREATE => {
                *stored = record.clone();
            }
            Some(stored) => {
                return Err(StoreError::Duplicate {
                    collection: R::COLLECTION,
                    id: stored.record_id().to_owned(),
                });
            }
            None => self.records.push(record.clone()),
        }
        Ok(record)
    }

    /// Applies `change` to the record with identifier `id`.
    pub(crate) fn modify(&mut self, id: &str, change: impl FnOnce(&mut R)) -> Mutation<Option<R>> {
        self.records
            .iter_mut()
            .find(|record| record.record_id() == id)
            .map_or(Mutation::Unchanged(None), |record| {
                change(record);
                Mutation::Changed(Some(record.clone()))
            })
    }

    /// Merges `patch` into the record with identifier `id`.
    pub(crate) fn update(
        &mut self,
        id: &str,
        patch: R::Patch,
        now: DateTime<Utc>,
    ) -> Mutation<Option<R>> {
        self.modify(id, |record| record.apply(patch, now))
    }

    /// Removes the record with identifier `id` and detaches every reference
    /// to it held by the remaining records.
    pub(crate) fn remove(&mut self, id: &str) -> Mutation<bool> {
        let before = self.records.len();
        self.records.retain(|record| record.record_id() != id);
        if self.records.len() == before {
            return Mutation::Unchanged(false);
        }
        for record in &mut self.records {
            record.forget(id);
        }
        Mutation::Changed(true)
    }

    /// Removes every record matching `filter` and detaches references to
    /// them held by the remaining records.
    pub(crate) fn remove_matching(&mut self, filter: &R::Filter) -> Mutation<usize> {
        let (removed, kept): (Vec<R>, Vec<R>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| record.matches(filter));
        self.records = kept;
        if removed.is_empty() {
            return Mutation::Unchanged(0);
        }
        for record in &mut self.records {
            for gone in &removed {
                record.forget(gone.record_id());
            }
        }
        Mutation::Changed(removed.len())
    }
}
