//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::SiteSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Aggregator endpoints
    #[serde(default)]
    pub site: SiteConfig,

    /// CSS selectors for the aggregator's markup
    #[serde(default)]
    pub selectors: SiteSelectors,

    /// HTTP, polling and worker pool settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// On-disk archive layout
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.site.base_url)
            .map_err(|e| AppError::validation(format!("site.base_url is invalid: {e}")))?;
        if let Some(front) = &self.site.front_page_url {
            Url::parse(front).map_err(|e| {
                AppError::validation(format!("site.front_page_url is invalid: {e}"))
            })?;
        }
        self.selectors.validate()?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.poll_interval_secs == 0 {
            return Err(AppError::validation(
                "crawler.poll_interval_secs must be > 0",
            ));
        }
        if self.crawler.post_workers == 0 {
            return Err(AppError::validation("crawler.post_workers must be > 0"));
        }
        if self.crawler.comment_workers == 0 {
            return Err(AppError::validation("crawler.comment_workers must be > 0"));
        }
        if self.crawler.queue_capacity == 0 {
            return Err(AppError::validation("crawler.queue_capacity must be > 0"));
        }
        if self.archive.filename_limit == 0 {
            return Err(AppError::validation("archive.filename_limit must be > 0"));
        }
        if self.archive.extension.trim_matches('.').is_empty() {
            return Err(AppError::validation("archive.extension is empty"));
        }
        Ok(())
    }

    /// URL polled for new posts.
    pub fn front_page_url(&self) -> &str {
        self.site
            .front_page_url
            .as_deref()
            .unwrap_or(&self.site.base_url)
    }
}

/// Aggregator endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL that relative story and discussion links resolve against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Listing page to poll (defaults to `base_url`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_page_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            front_page_url: None,
        }
    }
}

/// HTTP client, polling and worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept header for HTTP requests
    #[serde(default = "defaults::accept")]
    pub accept: String,

    /// Accept-Language header for HTTP requests
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause between front page polls in seconds
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Number of post workers
    #[serde(default = "defaults::post_workers")]
    pub post_workers: usize,

    /// Number of comment workers
    #[serde(default = "defaults::comment_workers")]
    pub comment_workers: usize,

    /// Capacity of each work queue; producers wait when it is full
    #[serde(default = "defaults::queue_capacity")]
    pub queue_capacity: usize,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            poll_interval_secs: defaults::poll_interval(),
            post_workers: defaults::post_workers(),
            comment_workers: defaults::comment_workers(),
            queue_capacity: defaults::queue_capacity(),
        }
    }
}

/// On-disk archive layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding one folder per archived post
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,

    /// Maximum length of a sanitized title
    #[serde(default = "defaults::filename_limit")]
    pub filename_limit: usize,

    /// URL suffixes that are never fetched
    #[serde(default = "defaults::ignored_extensions")]
    pub ignored_extensions: Vec<String>,

    /// Extension given to every saved page
    #[serde(default = "defaults::extension")]
    pub extension: String,

    /// Re-crawl posts whose folder already exists
    #[serde(default)]
    pub revisit_archived: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            filename_limit: defaults::filename_limit(),
            ignored_extensions: defaults::ignored_extensions(),
            extension: defaults::extension(),
            revisit_archived: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Site defaults
    pub fn base_url() -> String {
        "https://news.ycombinator.com/".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64; rv:52.0) Gecko/20100101 Firefox/52.0".into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.5".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn poll_interval() -> u64 {
        60
    }
    pub fn post_workers() -> usize {
        5
    }
    pub fn comment_workers() -> usize {
        5
    }
    pub fn queue_capacity() -> usize {
        256
    }

    // Archive defaults
    pub fn root_dir() -> PathBuf {
        PathBuf::from("hasker_news")
    }
    pub fn filename_limit() -> usize {
        80
    }
    pub fn ignored_extensions() -> Vec<String> {
        vec![".pdf".into(), ".jpg".into()]
    }
    pub fn extension() -> String {
        "html".into()
    }
}
