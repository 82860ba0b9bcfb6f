//! Social graph engine.
//!
//! [`SocialGraph`] owns no mutable state of its own. Every operation is a short
//! sequence of calls against the injected [`DocumentStore`]; each call is
//! atomic on one document, sequences spanning documents are not.

mod content;
mod engagement;
mod ranking;
mod timeline;
mod users;

pub use content::{PostDeletion, PostsDeletion};
pub use engagement::{FollowOutcome, LikeOutcome, LikeTarget, ToggleAck};
pub use ranking::{RankedComments, rank_by_likes};
pub use timeline::TimelineScope;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::{
    config::FeedSettings,
    errors::{FeedError, FeedResult},
    store::{Collection, DocumentStore, Filter, decode},
};

/// Source of creation and edit timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone)]
pub struct SocialGraph<S> {
    store: S,
    clock: Arc<dyn Clock>,
    settings: FeedSettings,
}

impl<S: DocumentStore> SocialGraph<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            settings: FeedSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: FeedSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Loads a record by id, failing with `NotFound` when absent.
    async fn fetch<T: DeserializeOwned>(&self, collection: Collection, entity_id: &str) -> FeedResult<T> {
        self.fetch_where(collection, &Filter::id(entity_id))
            .await?
            .ok_or_else(|| FeedError::not_found(collection.entity(), entity_id))
    }

    async fn fetch_where<T: DeserializeOwned>(&self, collection: Collection, filter: &Filter) -> FeedResult<Option<T>> {
        self.store.find_one(collection, filter).await?.map(decode).transpose()
    }

    /// Fails with `NotFound` unless a record with `entity_id` exists.
    async fn require(&self, collection: Collection, entity_id: &str) -> FeedResult<()> {
        if self.store.count(collection, &Filter::id(entity_id)).await? == 0 {
            return Err(FeedError::not_found(collection.entity(), entity_id));
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for SocialGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialGraph").field("settings", &self.settings).finish_non_exhaustive()
    }
}
