// src/pipeline/comments.rs

//! Comment worker pool.

use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::{CommentPageRef, PageSnapshot};
use crate::pipeline::context::{CrawlContext, SharedReceiver};
use crate::services::{Document, HtmlDocument};
use crate::utils::sanitize_filename;

/// Drain the comment queue until it is closed.
pub async fn run_comment_worker(
    id: usize,
    ctx: CrawlContext,
    queue: SharedReceiver<CommentPageRef>,
) -> Result<()> {
    log::debug!("Comment worker {id} started");

    while let Some(comment) = queue.recv().await {
        let result = process_comment(&ctx, &comment).await;
        ctx.stats.comment_done();

        if let Err(e) = result {
            if matches!(e, AppError::Storage { .. }) {
                ctx.stats.storage_error();
            }
            log::error!("Failed to save {}: {e}", comment.target_url);
        }
    }

    log::debug!("Comment worker {id} finished");
    Ok(())
}

/// Fetch a linked page and save it under its post's folder.
///
/// Returns the saved path, or `None` when the page was skipped because it
/// could not be fetched or has no title to name it by.
pub async fn process_comment(
    ctx: &CrawlContext,
    comment: &CommentPageRef,
) -> Result<Option<PathBuf>> {
    let config = &ctx.config;
    log::debug!("Loading comment link {}", comment.target_url);

    let outcome = ctx.fetcher.fetch(&comment.target_url).await;
    ctx.stats.record_fetch(&outcome);

    let Some(html) = outcome.content() else {
        return Ok(None);
    };

    let Some(title) = page_title(html, &config.selectors.page_title)? else {
        log::debug!("No title on {}, not saved", comment.target_url);
        return Ok(None);
    };

    let filename = sanitize_filename(&title, config.archive.filename_limit);
    if filename.is_empty() {
        return Ok(None);
    }

    let snapshot = PageSnapshot::new(html, filename);
    let path = snapshot.path_in(&comment.parent_folder, &config.archive.extension);

    ctx.storage.ensure_folder(&comment.parent_folder).await?;
    ctx.storage.write_page(&path, &snapshot.html).await?;
    ctx.stats.comment_page_saved();
    log::info!("SAVED: {}", path.display());

    Ok(Some(path))
}

fn page_title(html: &str, selector: &str) -> Result<Option<String>> {
    HtmlDocument::parse(html).title(selector)
}
