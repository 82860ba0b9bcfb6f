//! Timeline assembly.
//!
//! Each request runs the same steps: resolve the scope to a post filter, count
//! and fetch the requested window of posts newest first, then embed the ranked
//! comment window of every post.

use log::{debug, warn};

use super::SocialGraph;
use crate::{
    errors::FeedResult,
    id::{ensure_entity_id, is_entity_id},
    models::{
        FeedEntry, Post, User,
        fields::{AUTHOR_ID, CREATED_AT, ID},
    },
    pagination::{Page, PageRequest, Window},
    store::{Collection, DocumentStore, Filter, FindOptions, SortKey, decode},
};

/// Which posts a timeline shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineScope {
    /// Every post.
    Global,
    /// Posts written by one user.
    Author(String),
    /// Posts by the users the viewer follows; without a viewer, every post.
    Following(Option<String>),
}

impl<S: DocumentStore> SocialGraph<S> {
    pub async fn timeline(&self, scope: TimelineScope, request: PageRequest) -> FeedResult<Page<FeedEntry>> {
        let request = request.clamp_limit(self.settings.max_limit);
        let Some(filter) = self.resolve_scope(&scope).await? else {
            debug!("{scope:?} resolves to no authors");
            return Ok(Page::empty(request));
        };

        let total = self.store.count(Collection::Posts, &filter).await?;
        let window = Window::compute(request, total);
        if window.skip >= total {
            return Ok(Page::new(Vec::new(), window));
        }

        let posts = self.join_posts(filter, &window).await?;
        let entries = self.attach_comments(posts).await?;
        Ok(Page::new(entries, window))
    }

    pub async fn global_timeline(&self, request: PageRequest) -> FeedResult<Page<FeedEntry>> {
        self.timeline(TimelineScope::Global, request).await
    }

    pub async fn author_timeline(&self, author_id: &str, request: PageRequest) -> FeedResult<Page<FeedEntry>> {
        self.timeline(TimelineScope::Author(author_id.to_string()), request).await
    }

    pub async fn following_timeline(&self, viewer_id: Option<&str>, request: PageRequest) -> FeedResult<Page<FeedEntry>> {
        self.timeline(TimelineScope::Following(viewer_id.map(str::to_string)), request)
            .await
    }

    /// One post with its ranked comment window.
    pub async fn get_post(&self, post_id: &str) -> FeedResult<FeedEntry> {
        ensure_entity_id("post", post_id)?;
        let post: Post = self.fetch(Collection::Posts, post_id).await?;
        self.embed(post).await
    }

    /// `None` means the scope cannot match any post.
    async fn resolve_scope(&self, scope: &TimelineScope) -> FeedResult<Option<Filter>> {
        match scope {
            TimelineScope::Global | TimelineScope::Following(None) => Ok(Some(Filter::All)),
            TimelineScope::Author(author_id) => {
                ensure_entity_id("user", author_id)?;
                self.require(Collection::Users, author_id).await?;
                Ok(Some(Filter::eq(AUTHOR_ID, author_id.as_str())))
            }
            TimelineScope::Following(Some(viewer_id)) => {
                let viewer: Option<User> = if is_entity_id(viewer_id) {
                    self.fetch_where(Collection::Users, &Filter::id(viewer_id.as_str())).await?
                } else {
                    None
                };
                match viewer {
                    None => {
                        warn!("viewer {viewer_id:?} not resolvable, serving global timeline");
                        Ok(Some(Filter::All))
                    }
                    Some(viewer) if viewer.following.is_empty() => Ok(None),
                    Some(viewer) => Ok(Some(Filter::is_in(AUTHOR_ID, viewer.following))),
                }
            }
        }
    }

    async fn join_posts(&self, filter: Filter, window: &Window) -> FeedResult<Vec<Post>> {
        let options = FindOptions::new(filter)
            .with_sort([SortKey::desc(CREATED_AT), SortKey::desc(ID)])
            .with_window(window.skip, window.limit);
        self.store
            .find_many(Collection::Posts, &options)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn attach_comments(&self, posts: Vec<Post>) -> FeedResult<Vec<FeedEntry>> {
        let mut entries = Vec::with_capacity(posts.len());
        for post in posts {
            entries.push(self.embed(post).await?);
        }
        Ok(entries)
    }

    async fn embed(&self, post: Post) -> FeedResult<FeedEntry> {
        let ranked = self.rank_comments(&post.id, self.settings.embed_limit).await?;
        Ok(FeedEntry {
            like_count: post.like_count(),
            comments: ranked.comments,
            comment_count: ranked.count,
            post,
        })
    }
}
