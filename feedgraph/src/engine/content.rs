//! Post and comment authoring, including the delete cascades.
//!
//! Mutations of existing content filter on id AND author, so somebody else's
//! post or comment is indistinguishable from a missing one.

use log::{info, warn};
use serde::Serialize;

use super::SocialGraph;
use crate::{
    errors::{FeedError, FeedResult},
    id::ensure_entity_id,
    models::{
        Caller, Comment, Post, PostInput,
        fields::{AUTHOR_ID, COMMENTS, DESCRIPTION, MESSAGE, POST, POSTS, TITLE, UPDATED_AT},
        timestamp,
    },
    store::{Collection, DocumentStore, Filter, FindOptions, Update, UpdateOptions, decode},
    validators,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeletion {
    pub post_id: String,
    pub comments_deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsDeletion {
    pub posts_deleted: u64,
    pub comments_deleted: u64,
}

fn owned_by(entity_id: &str, caller: &Caller) -> Filter {
    Filter::id(entity_id).and_also(Filter::eq(AUTHOR_ID, caller.user_id.as_str()))
}

impl<S: DocumentStore> SocialGraph<S> {
    pub async fn create_post(&self, caller: &Caller, input: PostInput) -> FeedResult<Post> {
        ensure_entity_id("user", &caller.user_id)?;
        let mut issues = Vec::new();
        validators::require_text(TITLE, &input.title, &mut issues);
        validators::finish(issues)?;
        self.require(Collection::Users, &caller.user_id).await?;

        let now = self.now();
        let mut post = Post {
            id: String::new(),
            title: input.title,
            description: input.description,
            author: caller.snapshot(),
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
            likes: Vec::new(),
        };
        post.id = self
            .store
            .insert_one(Collection::Posts, serde_json::to_value(&post)?)
            .await?;

        self.store
            .update_one(
                Collection::Users,
                &Filter::id(caller.user_id.as_str()),
                &[Update::add_to_set(POSTS, post.id.as_str())],
                UpdateOptions::PLAIN,
            )
            .await
            .inspect_err(|err| warn!("post {} created but not linked to {}: {err}", post.id, caller.user_id))?;

        info!("{} created post {}", caller.user_id, post.id);
        Ok(post)
    }

    /// Rewrites the non-empty fields of `input`.
    pub async fn update_post(&self, caller: &Caller, post_id: &str, input: PostInput) -> FeedResult<Post> {
        ensure_entity_id("post", post_id)?;
        let mut updates = Vec::new();
        if !input.title.trim().is_empty() {
            updates.push(Update::set(TITLE, input.title));
        }
        if !input.description.trim().is_empty() {
            updates.push(Update::set(DESCRIPTION, input.description));
        }
        if updates.is_empty() {
            return Err(FeedError::invalid("nothing to update: title and description are both empty"));
        }
        updates.push(Update::set(UPDATED_AT, timestamp::to_value(&self.now())));

        let outcome = self
            .store
            .update_one(Collection::Posts, &owned_by(post_id, caller), &updates, UpdateOptions::RETURN_AFTER)
            .await?;
        match outcome.document {
            Some(document) if outcome.matched > 0 => decode(document),
            _ => Err(FeedError::not_found("post", post_id)),
        }
    }

    /// Deletes a post, unlinks it from its author and purges its comments.
    ///
    /// The three steps are not rolled back if a later one fails.
    pub async fn delete_post(&self, caller: &Caller, post_id: &str) -> FeedResult<PostDeletion> {
        ensure_entity_id("post", post_id)?;
        if self.store.delete_one(Collection::Posts, &owned_by(post_id, caller)).await? == 0 {
            return Err(FeedError::not_found("post", post_id));
        }

        self.store
            .update_one(
                Collection::Users,
                &Filter::id(caller.user_id.as_str()),
                &[Update::pull(POSTS, post_id)],
                UpdateOptions::PLAIN,
            )
            .await
            .inspect_err(|err| warn!("post {post_id} deleted, author link left behind: {err}"))?;
        let comments_deleted = self
            .store
            .delete_many(Collection::Comments, &Filter::eq(POST, post_id))
            .await
            .inspect_err(|err| warn!("post {post_id} deleted, comments left behind: {err}"))?;

        info!("{} deleted post {post_id} and {comments_deleted} comments", caller.user_id);
        Ok(PostDeletion {
            post_id: post_id.to_string(),
            comments_deleted,
        })
    }

    /// Deletes every post of the caller together with their comments.
    pub async fn delete_all_posts(&self, caller: &Caller) -> FeedResult<PostsDeletion> {
        ensure_entity_id("user", &caller.user_id)?;
        let by_caller = Filter::eq(AUTHOR_ID, caller.user_id.as_str());
        let post_ids: Vec<String> = self
            .store
            .find_many(Collection::Posts, &FindOptions::new(by_caller.clone()))
            .await?
            .into_iter()
            .map(decode::<Post>)
            .map(|post| post.map(|post| post.id))
            .collect::<FeedResult<_>>()?;

        let posts_deleted = self.store.delete_many(Collection::Posts, &by_caller).await?;
        let comments_deleted = if post_ids.is_empty() {
            0
        } else {
            self.store
                .delete_many(Collection::Comments, &Filter::is_in(POST, post_ids))
                .await
                .inspect_err(|err| warn!("posts of {} deleted, comments left behind: {err}", caller.user_id))?
        };
        self.store
            .update_one(
                Collection::Users,
                &Filter::id(caller.user_id.as_str()),
                &[Update::set(POSTS, serde_json::Value::Array(Vec::new()))],
                UpdateOptions::PLAIN,
            )
            .await?;

        info!("{} deleted {posts_deleted} posts and {comments_deleted} comments", caller.user_id);
        Ok(PostsDeletion {
            posts_deleted,
            comments_deleted,
        })
    }

    pub async fn create_comment(&self, caller: &Caller, post_id: &str, message: &str) -> FeedResult<Comment> {
        ensure_entity_id("post", post_id)?;
        let mut issues = Vec::new();
        validators::require_text(MESSAGE, message, &mut issues);
        validators::finish(issues)?;
        self.require(Collection::Posts, post_id).await?;

        let mut comment = Comment {
            id: String::new(),
            message: message.to_string(),
            post: post_id.to_string(),
            author: caller.snapshot(),
            created_at: self.now(),
            likes: Vec::new(),
        };
        comment.id = self
            .store
            .insert_one(Collection::Comments, serde_json::to_value(&comment)?)
            .await?;

        let linked = self
            .store
            .update_one(
                Collection::Posts,
                &Filter::id(post_id),
                &[Update::add_to_set(COMMENTS, comment.id.as_str())],
                UpdateOptions::PLAIN,
            )
            .await?;
        if linked.matched == 0 {
            // Post deleted since the existence check; drop the orphan.
            warn!("post {post_id} vanished while commenting, removing {}", comment.id);
            self.store
                .delete_one(Collection::Comments, &Filter::id(comment.id.as_str()))
                .await?;
            return Err(FeedError::not_found("post", post_id));
        }

        info!("{} commented {} on post {post_id}", caller.user_id, comment.id);
        Ok(comment)
    }

    pub async fn update_comment(&self, caller: &Caller, comment_id: &str, message: &str) -> FeedResult<Comment> {
        ensure_entity_id("comment", comment_id)?;
        let mut issues = Vec::new();
        validators::require_text(MESSAGE, message, &mut issues);
        validators::finish(issues)?;

        let outcome = self
            .store
            .update_one(
                Collection::Comments,
                &owned_by(comment_id, caller),
                &[Update::set(MESSAGE, message)],
                UpdateOptions::RETURN_AFTER,
            )
            .await?;
        match outcome.document {
            Some(document) if outcome.matched > 0 => decode(document),
            _ => Err(FeedError::not_found("comment", comment_id)),
        }
    }

    pub async fn delete_comment(&self, caller: &Caller, comment_id: &str) -> FeedResult<Comment> {
        ensure_entity_id("comment", comment_id)?;
        let filter = owned_by(comment_id, caller);
        let comment: Comment = self
            .fetch_where(Collection::Comments, &filter)
            .await?
            .ok_or_else(|| FeedError::not_found("comment", comment_id))?;
        if self.store.delete_one(Collection::Comments, &filter).await? == 0 {
            return Err(FeedError::not_found("comment", comment_id));
        }

        self.store
            .update_one(
                Collection::Posts,
                &Filter::id(comment.post.as_str()),
                &[Update::pull(COMMENTS, comment_id)],
                UpdateOptions::PLAIN,
            )
            .await
            .inspect_err(|err| warn!("comment {comment_id} deleted, post link left behind: {err}"))?;

        info!("{} deleted comment {comment_id}", caller.user_id);
        Ok(comment)
    }
}
