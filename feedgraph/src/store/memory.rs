use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;
use serde_json::Value;

use super::{
    Collection, DocumentStore, Filter, FindOptions, Update, UpdateOptions, UpdateOutcome, mutate_matched,
    prepare_insert, query, upsert_seed,
};
use crate::errors::{FeedError, FeedResult};

/// In-process document store.
///
/// Every call takes the single lock for its whole duration, which gives the
/// per-document atomicity the engine relies on. Cloning shares the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<Collection, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> FeedResult<MutexGuard<'_, HashMap<Collection, Vec<Value>>>> {
        self.inner
            .lock()
            .map_err(|_| FeedError::store("memory store lock poisoned"))
    }

    /// Number of documents currently held in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.state()
            .map(|state| state.get(&collection).map_or(0, Vec::len))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|collection| self.len(*collection) == 0)
    }
}

impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> FeedResult<Option<Value>> {
        let state = self.state()?;
        Ok(state
            .get(&collection)
            .and_then(|documents| documents.iter().find(|document| filter.matches(document)))
            .cloned())
    }

    async fn find_many(&self, collection: Collection, options: &FindOptions) -> FeedResult<Vec<Value>> {
        let state = self.state()?;
        let documents = state.get(&collection).cloned().unwrap_or_default();
        let selected = query::select(documents, options);
        debug!("memory find_many {}: {} documents", collection.name(), selected.len());
        Ok(selected)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> FeedResult<u64> {
        let state = self.state()?;
        let total = state
            .get(&collection)
            .map_or(0, |documents| documents.iter().filter(|document| filter.matches(document)).count());
        Ok(total as u64)
    }

    async fn insert_one(&self, collection: Collection, document: Value) -> FeedResult<String> {
        let (entity_id, document) = prepare_insert(document)?;
        let mut state = self.state()?;
        let documents = state.entry(collection).or_default();
        if documents.iter().any(|existing| Filter::id(entity_id.as_str()).matches(existing)) {
            return Err(FeedError::store(format!(
                "duplicate {} id {entity_id}",
                collection.entity()
            )));
        }
        documents.push(document);
        Ok(entity_id)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        updates: &[Update],
        options: UpdateOptions,
    ) -> FeedResult<UpdateOutcome> {
        let mut state = self.state()?;
        let documents = state.entry(collection).or_default();
        if let Some(slot) = documents.iter_mut().find(|document| filter.matches(document)) {
            let (after, outcome) = mutate_matched(slot, updates, options)?;
            *slot = after;
            return Ok(outcome);
        }
        if !options.upsert {
            return Ok(UpdateOutcome::unmatched());
        }

        let (entity_id, document) = prepare_insert(upsert_seed(filter, updates)?)?;
        documents.push(document.clone());
        Ok(UpdateOutcome {
            matched: 0,
            modified: 0,
            upserted_id: Some(entity_id),
            document: Some(document),
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> FeedResult<u64> {
        let mut state = self.state()?;
        let Some(documents) = state.get_mut(&collection) else {
            return Ok(0);
        };
        match documents.iter().position(|document| filter.matches(document)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> FeedResult<u64> {
        let mut state = self.state()?;
        let Some(documents) = state.get_mut(&collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|document| !filter.matches(document));
        Ok((before - documents.len()) as u64)
    }
}
