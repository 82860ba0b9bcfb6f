use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by the feed and engagement engine.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Referenced post, comment or user is absent. Also returned when an
    /// actor tries to mutate an entity it does not own, since ownership is
    /// part of the mutation filter.
    #[error("{collection} not found")]
    NotFound {
        collection: &'static str,
        entity_id: Option<String>,
    },

    /// The request is well-formed but not allowed (self-follow, malformed identifier, empty input).
    #[error("invalid operation: {message}")]
    InvalidOperation { message: Cow<'static, str> },

    /// Validation failed for one or more fields.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored document could not be encoded or decoded.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other store failure.
    #[error("store failure: {message}")]
    Store { message: Cow<'static, str> },
}

impl FeedError {
    pub fn not_found(collection: &'static str, entity_id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidOperation { message: message.into() }
    }

    pub fn store(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Store { message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Errors the caller should report as a bad request rather than a server failure.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidOperation { .. } | Self::Validation(_))
    }

    /// The collaborator store is unreachable or answered unexpectedly.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Redis(_) | Self::Serialization(_) | Self::Store { .. })
    }
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
