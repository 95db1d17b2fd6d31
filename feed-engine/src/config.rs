/// Configuration management for the feed engine
///
/// Loads configuration from environment variables. Every value has a
/// default so the engine can boot without configuration and still serve
/// the fixture dataset.
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    pub api: ApiConfig,
    /// Moderation gate settings
    pub moderation: ModerationConfig,
    /// Feed and comment limits
    pub feed: FeedConfig,
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the social REST API
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Moderation gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Endpoint of the text classification service
    pub url: String,
    /// Retry budget before failing open to SAFE
    #[serde(default = "default_moderation_retries")]
    pub max_retries: u32,
}

/// Feed and comment limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Posts fetched per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Comments fetched per page
    #[serde(default = "default_comment_page_size")]
    pub comment_page_size: u32,
    /// Reply depth bound; deeper replies are flattened to this level
    #[serde(default = "default_max_comment_depth")]
    pub max_comment_depth: u32,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_moderation_retries() -> u32 {
    2
}

fn default_page_size() -> u32 {
    10
}

fn default_comment_page_size() -> u32 {
    5
}

fn default_max_comment_depth() -> u32 {
    8
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080/api/v1/social".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            moderation: ModerationConfig {
                url: "http://localhost:8080/api/v1/moderate".to_string(),
                max_retries: default_moderation_retries(),
            },
            feed: FeedConfig {
                page_size: default_page_size(),
                comment_page_size: default_comment_page_size(),
                max_comment_depth: default_max_comment_depth(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let api = ApiConfig {
            base_url: std::env::var("FEED_API_BASE_URL").unwrap_or(defaults.api.base_url),
            timeout_secs: env_parse("FEED_API_TIMEOUT_SECS", defaults.api.timeout_secs),
        };

        let moderation = ModerationConfig {
            url: std::env::var("MODERATION_API_URL").unwrap_or(defaults.moderation.url),
            max_retries: env_parse("MODERATION_MAX_RETRIES", defaults.moderation.max_retries),
        };

        let feed = FeedConfig {
            page_size: env_parse("FEED_PAGE_SIZE", defaults.feed.page_size),
            comment_page_size: env_parse("FEED_COMMENT_PAGE_SIZE", defaults.feed.comment_page_size),
            max_comment_depth: env_parse("FEED_MAX_COMMENT_DEPTH", defaults.feed.max_comment_depth),
        };

        Config {
            api,
            moderation,
            feed,
        }
    }

    /// Retry policy for moderation calls
    pub fn moderation_retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.moderation.max_retries,
            ..Default::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.comment_page_size, 5);
        assert_eq!(config.feed.max_comment_depth, 8);
        assert_eq!(config.moderation.max_retries, 2);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("FEED_PAGE_SIZE", "25");
        std::env::set_var("FEED_API_BASE_URL", "http://feed.test/api");

        let config = Config::from_env();

        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.api.base_url, "http://feed.test/api");

        std::env::remove_var("FEED_PAGE_SIZE");
        std::env::remove_var("FEED_API_BASE_URL");
    }
}
