use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::MAX_LIMIT;

/// Number of ranked comments embedded in each timeline entry.
pub const DEFAULT_EMBED_LIMIT: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {0} not set")]
    MissingVariable(String),
}

/// Configuration loaded from `feedgraph.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub feed: FeedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Connection URL; `${VAR}` is expanded from the environment.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Namespace prepended to every key.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            prefix: default_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_prefix() -> String {
    "feedgraph".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_embed_limit")]
    pub embed_limit: u64,
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            embed_limit: DEFAULT_EMBED_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

fn default_embed_limit() -> u64 {
    DEFAULT_EMBED_LIMIT
}

fn default_max_limit() -> u64 {
    MAX_LIMIT
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path` when given, falling back to defaults, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Overrides values from `FEEDGRAPH_*` variables resolved through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FEEDGRAPH_REDIS_URL") {
            self.redis.url = url;
        }
        if let Some(prefix) = lookup("FEEDGRAPH_PREFIX") {
            self.redis.prefix = prefix;
        }
        if let Some(limit) = lookup("FEEDGRAPH_EMBED_LIMIT").and_then(|raw| raw.parse().ok()) {
            self.feed.embed_limit = limit;
        }
    }

    /// Redis URL with `${VAR}` expanded.
    pub fn redis_url(&self) -> Result<String, ConfigError> {
        self.redis_url_with(|name| std::env::var(name).ok())
    }

    pub fn redis_url_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        let url = self.redis.url.as_str();
        match url.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            Some(var_name) => lookup(var_name).ok_or_else(|| ConfigError::MissingVariable(var_name.to_string())),
            None => Ok(url.to_string()),
        }
    }
}
