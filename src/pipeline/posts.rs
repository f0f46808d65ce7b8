// src/pipeline/posts.rs

//! Post worker pool.

use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::{CommentPageRef, PageSnapshot, Post};
use crate::pipeline::context::{CrawlContext, SharedReceiver};
use crate::services::extract_comment_links;

/// Drain the post queue until it is closed.
///
/// Fails only when the comment queue has no consumers left.
pub async fn run_post_worker(
    id: usize,
    ctx: CrawlContext,
    queue: SharedReceiver<Post>,
    comments: mpsc::Sender<CommentPageRef>,
) -> Result<()> {
    log::debug!("Post worker {id} started");

    while let Some(post) = queue.recv().await {
        let result = process_post(&ctx, &post, &comments).await;
        ctx.in_flight.release(&post.folder_path);
        ctx.stats.post_done();

        match result {
            Ok(count) => log::info!("{}: {count} comment links queued", post.target_url),
            Err(e @ AppError::Task(_)) => {
                log::error!("Post worker {id} stopping: {e}");
                return Err(e);
            }
            Err(e) => {
                if matches!(e, AppError::Storage { .. }) {
                    ctx.stats.storage_error();
                }
                log::error!("Failed to archive {}: {e}", post.target_url);
            }
        }
    }

    log::debug!("Post worker {id} finished");
    Ok(())
}

/// Archive one post and queue the pages linked from its comments.
///
/// Returns the number of comment links queued.
pub async fn process_post(
    ctx: &CrawlContext,
    post: &Post,
    comments: &mpsc::Sender<CommentPageRef>,
) -> Result<usize> {
    let config = &ctx.config;
    log::debug!("Processing {} ({})", post.title, post.target_url);

    let target = ctx.fetcher.fetch(&post.target_url).await;
    ctx.stats.record_fetch(&target);

    let discussion = ctx.fetcher.fetch(&post.discussion_url).await;
    ctx.stats.record_fetch(&discussion);

    let links = match discussion.content() {
        Some(html) => Some(extract_comment_links(
            html,
            &config.selectors,
            &post.discussion_url,
        )?),
        None => None,
    };

    // The folder marks the post as seen even when nothing else is saved.
    ctx.storage.ensure_folder(&post.folder_path).await?;

    if let Some(html) = target.content() {
        let snapshot = PageSnapshot::new(html, post.folder_name());
        let path = snapshot.path_in(&post.folder_path, &config.archive.extension);
        ctx.storage.write_page(&path, &snapshot.html).await?;
        ctx.stats.post_snapshot_saved();
        log::info!("SAVED: {}", path.display());
    }

    let Some(links) = links else {
        log::warn!("No discussion page for {}, skipping comments", post.target_url);
        return Ok(0);
    };

    let count = links.len();
    for link in links {
        comments
            .send(post.comment_ref(link))
            .await
            .map_err(|_| AppError::task("comment queue closed"))?;
        ctx.stats.comment_enqueued();
    }

    Ok(count)
}
