//! Records kept in the document store and the projections handed to callers.
//!
//! Field names are camelCase in storage and in output. Filters address them
//! through the constants in [`fields`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored field paths used by filters, sorts and set mutations.
pub mod fields {
    pub const ID: &str = "id";
    pub const EMAIL: &str = "email";
    pub const USERNAME: &str = "username";
    pub const CREDENTIAL: &str = "credential";
    pub const POSTS: &str = "posts";
    pub const FOLLOWING: &str = "following";
    pub const FOLLOWERS: &str = "followers";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const MESSAGE: &str = "message";
    pub const AUTHOR_ID: &str = "author.id";
    pub const POST: &str = "post";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Fixed-width RFC 3339 timestamps (microsecond precision, `Z` suffix).
///
/// Stored strings compare lexicographically in chronological order, which is
/// what the store's generic sort relies on.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use serde_json::Value;

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn to_value(at: &DateTime<Utc>) -> Value {
        Value::String(format(at))
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

/// Identity and display name copied into posts and comments at creation time.
///
/// Not refreshed when the user later renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub id: String,
    pub username: String,
}

/// Resolved identity of an authenticated caller, supplied by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: String,
    pub username: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }

    pub fn snapshot(&self) -> AuthorSnapshot {
        AuthorSnapshot {
            id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Opaque credential (hash) owned by the auth layer.
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub posts: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Public view of a user; never carries the credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub posts: Vec<String>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            posts: user.posts,
            following: user.following,
            followers: user.followers,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: AuthorSnapshot,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
}

impl Post {
    pub fn like_count(&self) -> u64 {
        self.likes.len() as u64
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|liker| liker == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub message: String,
    /// Parent post id.
    pub post: String,
    pub author: AuthorSnapshot,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: Vec<String>,
}

impl Comment {
    pub fn like_count(&self) -> u64 {
        self.likes.len() as u64
    }
}

/// A post as it appears in a timeline: ranked comment window plus counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    #[serde(flatten)]
    pub post: Post,
    /// Top comments by like count, at most the embed limit.
    #[serde(rename = "topComments")]
    pub comments: Vec<Comment>,
    pub comment_count: u64,
    pub like_count: u64,
}

/// Title and description of a post being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl PostInput {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    /// Already hashed by the auth layer.
    pub credential: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub credential: Option<String>,
}
