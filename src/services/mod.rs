//! Service layer for the archiver.
//!
//! This module contains the page-level logic:
//! - HTML querying (`Document`, `HtmlDocument`)
//! - Front page parsing (`parse_front_page`)
//! - Comment link extraction (`extract_comment_links`)
//! - Bounded fetching (`Fetch`, `HttpFetcher`)

pub mod discussion;
pub mod document;
pub mod fetcher;
pub mod front_page;

pub use discussion::extract_comment_links;
pub use document::{Document, Element, HtmlDocument};
pub use fetcher::{Fetch, FetchError, FetchErrorKind, FetchOutcome, HttpFetcher};
pub use front_page::parse_front_page;
