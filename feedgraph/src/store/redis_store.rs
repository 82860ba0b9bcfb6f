use log::debug;
use redis::{AsyncCommands, aio::ConnectionManager, cmd};
use serde_json::Value;

use super::{
    Collection, DocumentStore, Filter, FindOptions, Update, UpdateOptions, UpdateOutcome, mutate_matched,
    prepare_insert, query, upsert_seed,
    query::ID_FIELD,
    scripts::{DOCUMENT_DELETE_SCRIPT, DOCUMENT_INSERT_SCRIPT, DOCUMENT_SWAP_SCRIPT},
};
use crate::{
    errors::{FeedError, FeedResult},
    keys::KeyContext,
};

/// Attempts at swapping a document before an update gives up under contention.
const MAX_SWAP_ATTEMPTS: usize = 16;
const SCAN_COUNT: usize = 1000;

/// Document store backed by Redis.
///
/// Each document is a JSON string under `{prefix}:{collection}:{id}`; a sorted
/// set per collection records insertion order. Set mutations read the document,
/// apply the change locally and write it back through a compare-and-swap
/// script, so a concurrent writer to the same document forces a re-read rather
/// than a lost update.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

type Stored = (String, Value);

impl RedisStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    /// Opens a managed connection to `url`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext::new(&self.prefix)
    }

    async fn load(&self, collection: Collection, entity_id: &str) -> FeedResult<Option<Stored>> {
        let mut conn = self.conn.clone();
        let key = self.keys().document(collection.name(), entity_id);
        let raw: Option<String> = conn.get(&key).await?;
        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw)?;
                Ok(Some((raw, value)))
            }
            None => Ok(None),
        }
    }

    async fn load_all(&self, collection: Collection) -> FeedResult<Vec<Stored>> {
        let mut conn = self.conn.clone();
        let keys = self.keys();
        let ids: Vec<String> = conn.zrange(keys.index(collection.name()), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let document_keys: Vec<String> = ids.iter().map(|id| keys.document(collection.name(), id)).collect();
        let raws: Vec<Option<String>> = cmd("MGET").arg(&document_keys).query_async(&mut conn).await?;
        let mut documents = Vec::with_capacity(raws.len());
        // Ids whose document vanished between ZRANGE and MGET come back as nil.
        for raw in raws.into_iter().flatten() {
            let value = serde_json::from_str(&raw)?;
            documents.push((raw, value));
        }
        debug!("redis loaded {} {}", documents.len(), collection.name());
        Ok(documents)
    }

    async fn candidates(&self, collection: Collection, filter: &Filter) -> FeedResult<Vec<Stored>> {
        let loaded: Vec<Stored> = match filter.id_hint() {
            Some(entity_id) => self.load(collection, entity_id).await?.into_iter().collect(),
            None => self.load_all(collection).await?,
        };
        Ok(loaded.into_iter().filter(|(_, document)| filter.matches(document)).collect())
    }

    async fn insert_prepared(&self, collection: Collection, entity_id: &str, document: &Value) -> FeedResult<()> {
        let keys = self.keys();
        let payload = serde_json::to_string(document)?;
        let mut conn = self.conn.clone();

        let mut invocation = DOCUMENT_INSERT_SCRIPT.prepare_invoke();
        invocation
            .key(keys.document(collection.name(), entity_id))
            .key(keys.index(collection.name()))
            .key(keys.sequence(collection.name()))
            .arg(payload)
            .arg(entity_id);
        let sequence: i64 = invocation.invoke_async(&mut conn).await?;
        if sequence == 0 {
            return Err(FeedError::store(format!(
                "duplicate {} id {entity_id}",
                collection.entity()
            )));
        }
        Ok(())
    }

    async fn remove(&self, collection: Collection, entity_id: &str) -> FeedResult<u64> {
        let keys = self.keys();
        let mut conn = self.conn.clone();
        let mut invocation = DOCUMENT_DELETE_SCRIPT.prepare_invoke();
        invocation
            .key(keys.document(collection.name(), entity_id))
            .key(keys.index(collection.name()))
            .arg(entity_id);
        let removed: u64 = invocation.invoke_async(&mut conn).await?;
        Ok(removed)
    }

    /// Deletes every key under this store's prefix.
    ///
    /// This performs a SCAN + DEL operation to safely delete keys without blocking Redis.
    pub async fn clear(&self) -> FeedResult<u64> {
        let mut conn = self.conn.clone();
        let pattern = self.keys().namespace_pattern();
        let mut cursor: u64 = 0;
        let mut total_deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = cmd("DEL").arg(&keys).query_async(&mut conn).await?;
                total_deleted += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }
}

fn stored_id(document: &Value) -> FeedResult<String> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| FeedError::store("stored document has no id"))
}

impl DocumentStore for RedisStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> FeedResult<Option<Value>> {
        Ok(self
            .candidates(collection, filter)
            .await?
            .into_iter()
            .next()
            .map(|(_, document)| document))
    }

    async fn find_many(&self, collection: Collection, options: &FindOptions) -> FeedResult<Vec<Value>> {
        let documents = self.load_all(collection).await?;
        Ok(query::select(documents.into_iter().map(|(_, document)| document), options))
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> FeedResult<u64> {
        Ok(self.candidates(collection, filter).await?.len() as u64)
    }

    async fn insert_one(&self, collection: Collection, document: Value) -> FeedResult<String> {
        let (entity_id, document) = prepare_insert(document)?;
        self.insert_prepared(collection, &entity_id, &document).await?;
        Ok(entity_id)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        updates: &[Update],
        options: UpdateOptions,
    ) -> FeedResult<UpdateOutcome> {
        let Some((mut raw, mut current)) = self.candidates(collection, filter).await?.into_iter().next() else {
            if !options.upsert {
                return Ok(UpdateOutcome::unmatched());
            }
            let (entity_id, document) = prepare_insert(upsert_seed(filter, updates)?)?;
            self.insert_prepared(collection, &entity_id, &document).await?;
            return Ok(UpdateOutcome {
                matched: 0,
                modified: 0,
                upserted_id: Some(entity_id),
                document: Some(document),
            });
        };

        let entity_id = stored_id(&current)?;
        let key = self.keys().document(collection.name(), &entity_id);
        let mut conn = self.conn.clone();

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let (after, outcome) = mutate_matched(&current, updates, options)?;
            if outcome.modified == 0 {
                return Ok(outcome);
            }

            let replacement = serde_json::to_string(&after)?;
            let mut invocation = DOCUMENT_SWAP_SCRIPT.prepare_invoke();
            invocation.key(&key).arg(&raw).arg(&replacement);
            let swapped: i64 = invocation.invoke_async(&mut conn).await?;
            match swapped {
                1 => return Ok(outcome),
                -1 => return Ok(UpdateOutcome::unmatched()),
                _ => {
                    debug!("{key} changed underneath update (attempt {attempt}), re-reading");
                    match self.load(collection, &entity_id).await? {
                        Some((fresh_raw, fresh)) if filter.matches(&fresh) => {
                            raw = fresh_raw;
                            current = fresh;
                        }
                        _ => return Ok(UpdateOutcome::unmatched()),
                    }
                }
            }
        }

        Err(FeedError::store(format!(
            "update of {key} lost {MAX_SWAP_ATTEMPTS} races to concurrent writers"
        )))
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> FeedResult<u64> {
        match self.candidates(collection, filter).await?.into_iter().next() {
            Some((_, document)) => self.remove(collection, &stored_id(&document)?).await,
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: Collection, filter: &Filter) -> FeedResult<u64> {
        let mut deleted = 0;
        for (_, document) in self.candidates(collection, filter).await? {
            deleted += self.remove(collection, &stored_id(&document)?).await?;
        }
        Ok(deleted)
    }
}
