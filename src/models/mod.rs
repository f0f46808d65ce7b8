// src/models/mod.rs

//! Domain models for the archiver.
//!
//! This module contains the configuration tree and the data structures
//! that flow through the crawl pipeline.

mod config;
mod post;
mod selectors;

// Re-export all public types
pub use config::{ArchiveConfig, Config, CrawlerConfig, SiteConfig};
pub use post::{CommentPageRef, FrontPageEntry, PageSnapshot, Post};
pub use selectors::SiteSelectors;
