//! Like and follow toggles.
//!
//! A toggle inspects the current membership of the actor in the relevant set
//! and then flips it. The result reports the transition this call caused.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::SocialGraph;
use crate::{
    errors::{FeedError, FeedResult},
    id::ensure_entity_id,
    models::fields::{FOLLOWERS, FOLLOWING, LIKES},
    store::{Collection, DocumentStore, Filter, Update, UpdateOptions},
};

/// Kind of content a like applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    Post,
    Comment,
}

impl LikeTarget {
    pub const fn collection(self) -> Collection {
        match self {
            LikeTarget::Post => Collection::Posts,
            LikeTarget::Comment => Collection::Comments,
        }
    }

    /// Capitalized noun used in acknowledgement messages.
    pub const fn label(self) -> &'static str {
        match self {
            LikeTarget::Post => "Post",
            LikeTarget::Comment => "Comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

impl LikeOutcome {
    pub fn acknowledge(self, target: LikeTarget) -> ToggleAck {
        let verb = match self {
            LikeOutcome::Liked => "Liked",
            LikeOutcome::Unliked => "Disliked",
        };
        ToggleAck {
            message: format!("{} {verb}", target.label()),
            is_following: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowOutcome {
    Followed,
    Unfollowed,
}

impl FollowOutcome {
    pub fn is_following(self) -> bool {
        matches!(self, FollowOutcome::Followed)
    }

    pub fn acknowledge(self) -> ToggleAck {
        let message = match self {
            FollowOutcome::Followed => "Followed",
            FollowOutcome::Unfollowed => "Unfollowed",
        };
        ToggleAck {
            message: message.to_string(),
            is_following: Some(self.is_following()),
        }
    }
}

/// Response body of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAck {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

impl<S: DocumentStore> SocialGraph<S> {
    /// Adds or removes `actor_id` from the target's likes.
    pub async fn toggle_like(&self, actor_id: &str, target_id: &str, target: LikeTarget) -> FeedResult<LikeOutcome> {
        ensure_entity_id("actor", actor_id)?;
        ensure_entity_id(target.collection().entity(), target_id)?;
        let collection = target.collection();
        self.require(collection, target_id).await?;

        let liked = self.is_member(collection, target_id, LIKES, actor_id).await?;
        let (update, outcome) = if liked {
            (Update::pull(LIKES, actor_id), LikeOutcome::Unliked)
        } else {
            (Update::add_to_set(LIKES, actor_id), LikeOutcome::Liked)
        };

        let written = self
            .store
            .update_one(collection, &Filter::id(target_id), &[update], UpdateOptions::PLAIN)
            .await?;
        if written.matched == 0 {
            return Err(FeedError::not_found(collection.entity(), target_id));
        }
        // The outcome follows the pre-write read. A racing identical toggle
        // leaves nothing to modify but the set already holds the reported state.
        if written.modified == 0 {
            debug!("{actor_id} {outcome:?} {} {target_id} was already applied", collection.entity());
        }

        info!("{actor_id} {outcome:?} {} {target_id}", collection.entity());
        Ok(outcome)
    }

    /// Follows `target_id` if `actor_id` is not following it yet, unfollows otherwise.
    ///
    /// Both sides of the edge are written; the second write is issued even if
    /// the first changed nothing.
    pub async fn toggle_follow(&self, actor_id: &str, target_id: &str) -> FeedResult<FollowOutcome> {
        ensure_entity_id("actor", actor_id)?;
        ensure_entity_id("user", target_id)?;
        self.require(Collection::Users, target_id).await?;
        if actor_id == target_id {
            return Err(FeedError::invalid("users cannot follow themselves"));
        }
        self.require(Collection::Users, actor_id).await?;

        let (forward, reverse, outcome) = if self.is_following(actor_id, target_id).await? {
            (
                Update::pull(FOLLOWING, target_id),
                Update::pull(FOLLOWERS, actor_id),
                FollowOutcome::Unfollowed,
            )
        } else {
            (
                Update::add_to_set(FOLLOWING, target_id),
                Update::add_to_set(FOLLOWERS, actor_id),
                FollowOutcome::Followed,
            )
        };

        let first = self
            .store
            .update_one(Collection::Users, &Filter::id(actor_id), &[forward], UpdateOptions::PLAIN)
            .await?;
        if first.matched == 0 {
            return Err(FeedError::not_found("user", actor_id));
        }

        let second = self
            .store
            .update_one(Collection::Users, &Filter::id(target_id), &[reverse], UpdateOptions::PLAIN)
            .await
            .inspect_err(|err| warn!("follow edge {actor_id} -> {target_id} half-applied: {err}"))?;
        if second.matched == 0 {
            warn!("follow edge {actor_id} -> {target_id} half-applied: target vanished");
            return Err(FeedError::not_found("user", target_id));
        }

        info!("{actor_id} {outcome:?} {target_id}");
        Ok(outcome)
    }

    pub async fn is_following(&self, actor_id: &str, target_id: &str) -> FeedResult<bool> {
        self.is_member(Collection::Users, actor_id, FOLLOWING, target_id).await
    }

    /// Whether the set at `field` of document `entity_id` holds `member`.
    ///
    /// An absent document counts as "not a member"; store errors propagate.
    async fn is_member(&self, collection: Collection, entity_id: &str, field: &str, member: &str) -> FeedResult<bool> {
        let filter = Filter::id(entity_id).and_also(Filter::contains(field, member));
        Ok(self.store.find_one(collection, &filter).await?.is_some())
    }
}
