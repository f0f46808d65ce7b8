//! Bounded page fetching.
//!
//! A fetch never returns an error to its caller. It ends in one of three
//! outcomes: the page text, a deliberate skip (ignored extension, no network
//! call made), or a failure carrying what went wrong.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::error::Result;
use crate::models::Config;
use crate::utils::http::create_async_client;
use crate::utils::is_ignored;

/// Why a fetch produced no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Connect,
    Timeout,
    Disconnected,
    Decode,
    Status(u16),
    Request,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Connect => write!(f, "connection error"),
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Disconnected => write!(f, "server disconnected"),
            FetchErrorKind::Decode => write!(f, "decode error"),
            FetchErrorKind::Status(code) => write!(f, "HTTP status {code}"),
            FetchErrorKind::Request => write!(f, "request error"),
        }
    }
}

impl From<&reqwest::Error> for FetchErrorKind {
    fn from(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if e.is_connect() {
            FetchErrorKind::Connect
        } else if e.is_decode() {
            FetchErrorKind::Decode
        } else if e.is_body() {
            FetchErrorKind::Disconnected
        } else if let Some(status) = e.status() {
            FetchErrorKind::Status(status.as_u16())
        } else {
            FetchErrorKind::Request
        }
    }
}

/// A failed fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} fetching {url}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

/// Terminal result of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Content(String),
    Skipped,
    Failed(FetchError),
}

impl FetchOutcome {
    /// Page text, if the fetch produced any.
    pub fn content(&self) -> Option<&str> {
        match self {
            FetchOutcome::Content(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, FetchOutcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Capability to fetch one page.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Fetcher backed by a shared `reqwest` client.
pub struct HttpFetcher {
    client: Client,
    ignored_extensions: Vec<String>,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = create_async_client(&config.crawler)?;
        Ok(Self::with_client(
            client,
            config.archive.ignored_extensions.clone(),
            config.crawler.timeout(),
        ))
    }

    pub fn with_client(client: Client, ignored_extensions: Vec<String>, timeout: Duration) -> Self {
        Self {
            client,
            ignored_extensions,
            timeout,
        }
    }

    async fn get(&self, url: &str) -> std::result::Result<String, FetchErrorKind> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchErrorKind::from(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchErrorKind::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| FetchErrorKind::from(&e))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        if is_ignored(url, &self.ignored_extensions) {
            log::debug!("Skipping ignored URL {url}");
            return FetchOutcome::Skipped;
        }

        let result = match tokio::time::timeout(self.timeout, self.get(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchErrorKind::Timeout),
        };

        match result {
            Ok(text) => FetchOutcome::Content(text),
            Err(kind) => {
                log::warn!("{kind} with {url}");
                FetchOutcome::Failed(FetchError {
                    url: url.to_string(),
                    kind,
                })
            }
        }
    }
}
