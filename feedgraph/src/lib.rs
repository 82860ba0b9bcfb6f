//! Feedgraph core library.
//!
//! Engagement toggles (likes, follows), like-ranked comment windows and
//! paginated timelines over a pluggable document store.

pub mod config;
pub mod engine;
pub mod errors;
pub mod id;
pub mod keys;
pub mod models;
pub mod pagination;
pub mod store;
pub mod validators;

pub use config::{ConfigError, FeedSettings, RedisSettings, Settings};
pub use engine::{
    Clock, FollowOutcome, LikeOutcome, LikeTarget, PostDeletion, PostsDeletion, RankedComments, SocialGraph,
    SystemClock, TimelineScope, ToggleAck,
};
pub use errors::*;
pub use models::{
    AuthorSnapshot, Caller, Comment, FeedEntry, NewUser, Post, PostInput, ProfileUpdate, User, UserProfile,
    UserSummary,
};
pub use pagination::{Page, PageRequest, Window};
pub use store::{Collection, DocumentStore, MemoryStore, RedisStore};

// Re-export redis types so users don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;
