// src/models/selectors.rs

//! CSS selectors for scraping the aggregator.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// CSS selectors for the front page, discussion pages and linked pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSelectors {
    /// Anchor holding each story's title and target URL
    #[serde(default = "default_story_link")]
    pub story_link: String,

    /// Cell under each story whose last anchor points at the discussion
    #[serde(default = "default_subtext")]
    pub subtext: String,

    /// Comment body element on a discussion page
    #[serde(default = "default_comment_body")]
    pub comment_body: String,

    /// Element holding a page's title
    #[serde(default = "default_page_title")]
    pub page_title: String,

    /// Substring marking reply links that leak into comment bodies
    #[serde(default = "default_reply_marker")]
    pub reply_marker: String,
}

fn default_story_link() -> String {
    "a.storylink".to_string()
}

fn default_subtext() -> String {
    "td.subtext".to_string()
}

fn default_comment_body() -> String {
    "span.c00".to_string()
}

fn default_page_title() -> String {
    "title".to_string()
}

fn default_reply_marker() -> String {
    "reply".to_string()
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            story_link: default_story_link(),
            subtext: default_subtext(),
            comment_body: default_comment_body(),
            page_title: default_page_title(),
            reply_marker: default_reply_marker(),
        }
    }
}

impl SiteSelectors {
    /// Check every selector parses and the reply marker is set.
    pub fn validate(&self) -> Result<()> {
        for selector in [
            &self.story_link,
            &self.subtext,
            &self.comment_body,
            &self.page_title,
        ] {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector.as_str(), format!("{e:?}")))?;
        }
        if self.reply_marker.is_empty() {
            return Err(AppError::validation("selectors.reply_marker is empty"));
        }
        Ok(())
    }
}
