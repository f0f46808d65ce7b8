//! Comment link extraction from discussion pages.

use crate::error::Result;
use crate::models::SiteSelectors;
use crate::services::document::{Document, Element, HtmlDocument};
use crate::utils::resolve;

/// Collect the links found in comment bodies, in document order.
pub fn extract_comment_links(
    html: &str,
    selectors: &SiteSelectors,
    discussion_url: &str,
) -> Result<Vec<String>> {
    let document = HtmlDocument::parse(html);
    comment_links(&document, selectors, discussion_url)
}

/// Take the first anchor of every comment body.
///
/// The site leaves comment spans unclosed, so the reply link that follows a
/// comment can be parsed as part of the next comment body. Anything whose
/// href contains the reply marker is dropped. This is a heuristic tied to the
/// site's current markup.
pub fn comment_links<D: Document>(
    document: &D,
    selectors: &SiteSelectors,
    discussion_url: &str,
) -> Result<Vec<String>> {
    let mut links = Vec::new();

    for comment in document.select(&selectors.comment_body)? {
        let Some(href) = comment
            .select("a")?
            .first()
            .and_then(|anchor| anchor.attr("href"))
        else {
            continue;
        };

        if href.contains(selectors.reply_marker.as_str()) {
            continue;
        }

        links.push(resolve(discussion_url, &href));
    }

    Ok(links)
}
