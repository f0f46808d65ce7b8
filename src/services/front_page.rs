//! Front page parsing.
//!
//! Each story on the front page is a title anchor followed, further down, by
//! a subtext cell whose last anchor links to the discussion thread. The two
//! lists are matched up by position, so they must be the same length.

use crate::error::{AppError, Result};
use crate::models::{FrontPageEntry, SiteSelectors};
use crate::services::document::{Document, Element, HtmlDocument};
use crate::utils::resolve;

/// Parse front page HTML into entries, in page order.
pub fn parse_front_page(
    html: &str,
    selectors: &SiteSelectors,
    base_url: &str,
) -> Result<Vec<FrontPageEntry>> {
    let document = HtmlDocument::parse(html);
    extract_entries(&document, selectors, base_url)
}

/// Pair story anchors with subtext cells.
pub fn extract_entries<D: Document>(
    document: &D,
    selectors: &SiteSelectors,
    base_url: &str,
) -> Result<Vec<FrontPageEntry>> {
    let stories = document.select(&selectors.story_link)?;
    let subtexts = document.select(&selectors.subtext)?;

    if stories.len() != subtexts.len() {
        return Err(AppError::ParseMismatch {
            stories: stories.len(),
            subtexts: subtexts.len(),
        });
    }

    stories
        .iter()
        .zip(subtexts.iter())
        .enumerate()
        .map(|(position, (story, subtext))| -> Result<FrontPageEntry> {
            let discussion_href = subtext
                .select("a")?
                .last()
                .and_then(|a| a.attr("href"))
                .ok_or_else(|| {
                    AppError::parse(format!(
                        "subtext cell {position} has no discussion link"
                    ))
                })?;
            let story_href = story.attr("href").ok_or_else(|| {
                AppError::parse(format!("story link {position} has no href"))
            })?;

            Ok(FrontPageEntry {
                target_url: resolve(base_url, &story_href),
                title: story.text().trim().to_string(),
                discussion_url: resolve(base_url, &discussion_href),
            })
        })
        .collect()
}
