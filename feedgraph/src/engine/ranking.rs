use serde::Serialize;

use super::SocialGraph;
use crate::{
    errors::FeedResult,
    id::ensure_entity_id,
    models::{
        Comment,
        fields::{CREATED_AT, POST},
    },
    pagination::{Page, PageRequest, Window},
    store::{Collection, DocumentStore, Filter, FindOptions, SortKey, decode},
};

/// Top comments of a post plus the number of comments it has in total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedComments {
    pub comments: Vec<Comment>,
    pub count: u64,
}

/// Orders comments by like count, most liked first.
///
/// The sort is stable, so equal counts keep their incoming order.
pub fn rank_by_likes(comments: &mut [Comment]) {
    comments.sort_by_key(|comment| std::cmp::Reverse(comment.like_count()));
}

impl<S: DocumentStore> SocialGraph<S> {
    /// Up to `limit` comments of `post_id`, most liked first, ties oldest first.
    ///
    /// A post without comments (or an unknown post) yields an empty window.
    pub async fn rank_comments(&self, post_id: &str, limit: u64) -> FeedResult<RankedComments> {
        ensure_entity_id("post", post_id)?;
        let mut comments = self.comments_oldest_first(Filter::eq(POST, post_id)).await?;
        let count = comments.len() as u64;
        rank_by_likes(&mut comments);
        comments.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(RankedComments { comments, count })
    }

    /// Paginated comment listing in ranked order, optionally restricted to one post.
    pub async fn list_comments(&self, post_id: Option<&str>, request: PageRequest) -> FeedResult<Page<Comment>> {
        let request = request.clamp_limit(self.settings.max_limit);
        let filter = match post_id {
            Some(post_id) => Filter::eq(POST, ensure_entity_id("post", post_id)?),
            None => Filter::All,
        };
        let mut comments = self.comments_oldest_first(filter).await?;
        let window = Window::compute(request, comments.len() as u64);
        rank_by_likes(&mut comments);
        Ok(Page::new(window.apply(comments), window))
    }

    pub async fn get_comment(&self, comment_id: &str) -> FeedResult<Comment> {
        ensure_entity_id("comment", comment_id)?;
        self.fetch(Collection::Comments, comment_id).await
    }

    async fn comments_oldest_first(&self, filter: Filter) -> FeedResult<Vec<Comment>> {
        let options = FindOptions::new(filter).with_sort([SortKey::asc(CREATED_AT)]);
        self.store
            .find_many(Collection::Comments, &options)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }
}
