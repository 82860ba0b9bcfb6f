//! Document store capability consumed by the engine.
//!
//! The engine never talks to a database directly. It issues the handful of
//! calls below against a [`DocumentStore`]; each call touching one document is
//! atomic, nothing spanning documents is.

mod memory;
pub mod query;
mod redis_store;
mod scripts;

pub use memory::MemoryStore;
pub use query::{Filter, FindOptions, ReturnDocument, SortKey, SortOrder, Update, UpdateOptions, UpdateOutcome};
pub use redis_store::RedisStore;

use serde_json::Value;

use crate::{
    errors::{FeedError, FeedResult},
    id::generate_entity_id,
    store::query::{ID_FIELD, apply_updates},
};

/// Collections the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Posts,
    Comments,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::Posts, Collection::Comments];

    pub const fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
        }
    }

    /// Singular noun used in error messages.
    pub const fn entity(self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::Posts => "post",
            Collection::Comments => "comment",
        }
    }
}

/// Minimal document-database surface.
///
/// `find_many` sorts stably over the natural order of the collection, which is
/// insertion order. Documents are JSON objects carrying a string `id`.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> FeedResult<Option<Value>>;

    async fn find_many(&self, collection: Collection, options: &FindOptions) -> FeedResult<Vec<Value>>;

    async fn count(&self, collection: Collection, filter: &Filter) -> FeedResult<u64>;

    /// Inserts the document and returns its identifier (generated when absent).
    async fn insert_one(&self, collection: Collection, document: Value) -> FeedResult<String>;

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        updates: &[Update],
        options: UpdateOptions,
    ) -> FeedResult<UpdateOutcome>;

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> FeedResult<u64>;

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> FeedResult<u64>;
}

/// Assigns an identifier to a document about to be inserted.
pub(crate) fn prepare_insert(mut document: Value) -> FeedResult<(String, Value)> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| FeedError::store("documents must be JSON objects"))?;
    let entity_id = match object.get(ID_FIELD) {
        Some(Value::String(existing)) if !existing.is_empty() => existing.clone(),
        _ => {
            let generated = generate_entity_id();
            object.insert(ID_FIELD.to_string(), Value::String(generated.clone()));
            generated
        }
    };
    Ok((entity_id, document))
}

/// Applies `updates` to a matched document and shapes the outcome per `options`.
pub(crate) fn mutate_matched(
    before: &Value,
    updates: &[Update],
    options: UpdateOptions,
) -> FeedResult<(Value, UpdateOutcome)> {
    let mut after = before.clone();
    let modified = apply_updates(&mut after, updates)?;
    let document = match options.return_document {
        ReturnDocument::Before => before.clone(),
        ReturnDocument::After => after.clone(),
    };
    Ok((
        after,
        UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
            upserted_id: None,
            document: Some(document),
        },
    ))
}

/// Builds the document an upsert inserts when nothing matched.
pub(crate) fn upsert_seed(filter: &Filter, updates: &[Update]) -> FeedResult<Value> {
    let mut seed = filter.seed_document();
    apply_updates(&mut seed, updates)?;
    Ok(seed)
}

/// Decodes a stored document into a typed record.
pub fn decode<T: serde::de::DeserializeOwned>(document: Value) -> FeedResult<T> {
    serde_json::from_value(document).map_err(FeedError::from)
}
