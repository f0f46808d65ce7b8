// src/pipeline/discovery.rs

//! Discovery poller.
//!
//! Every cycle fetches the front page, turns its rows into posts, drops the
//! ones that are not worth or no longer need archiving, and enqueues the rest
//! in page order. A post stays claimed in `CrawlContext::in_flight` from
//! enqueue until a post worker finishes with it, so a slow post is never
//! queued twice.

use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::pipeline::context::CrawlContext;
use crate::services::parse_front_page;
use crate::utils::{is_ignored, is_valid_url};

/// How long the poller keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Poll until shutdown is requested.
    Forever,
    /// Run a single cycle.
    Once,
}

/// Run discovery cycles until shutdown.
///
/// Parse and fetch problems only skip the current cycle. The poller stops with
/// an error when the post queue has no consumers left.
pub async fn run_poller(
    ctx: CrawlContext,
    posts: mpsc::Sender<Post>,
    mode: PollMode,
) -> Result<()> {
    let interval = ctx.config.crawler.poll_interval();

    loop {
        log::info!("Checking {} for new posts", ctx.config.front_page_url());

        match poll_once(&ctx, &posts).await {
            Ok(0) => {
                ctx.stats.cycle_finished(false);
                log::info!("No new posts");
            }
            Ok(count) => {
                ctx.stats.cycle_finished(false);
                log::info!("Enqueued {count} new posts");
            }
            Err(e @ AppError::Task(_)) => return Err(e),
            Err(e) => {
                ctx.stats.cycle_finished(true);
                log::warn!("Discovery cycle skipped: {e}");
            }
        }

        log::debug!("Totals so far: {:?}", ctx.stats.snapshot());

        if mode == PollMode::Once || ctx.shutdown.is_cancelled() {
            break;
        }

        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    log::info!("Poller stopped");
    Ok(())
}

/// Run one discovery cycle and return how many posts were enqueued.
pub async fn poll_once(ctx: &CrawlContext, posts: &mpsc::Sender<Post>) -> Result<usize> {
    let candidates = discover(ctx).await?;
    let mut enqueued = 0;

    for post in candidates {
        let folder = post.folder_path.clone();
        if !ctx.in_flight.claim(&folder) {
            log::debug!("Still in flight: {}", folder.display());
            continue;
        }

        log::debug!("Enqueueing {} ({})", post.title, post.target_url);
        tokio::select! {
            sent = posts.send(post) => {
                if sent.is_err() {
                    ctx.in_flight.release(&folder);
                    return Err(AppError::task("post queue closed"));
                }
            }
            _ = ctx.shutdown.cancelled() => {
                ctx.in_flight.release(&folder);
                log::info!("Shutdown requested, dropping the rest of this cycle");
                break;
            }
        }
        ctx.stats.post_enqueued();
        enqueued += 1;
    }

    Ok(enqueued)
}

/// Fetch the front page and return the posts that should be archived.
pub async fn discover(ctx: &CrawlContext) -> Result<Vec<Post>> {
    let config = &ctx.config;
    let outcome = ctx.fetcher.fetch(config.front_page_url()).await;
    ctx.stats.record_fetch(&outcome);

    let Some(html) = outcome.content() else {
        log::warn!("Front page unavailable this cycle");
        return Ok(Vec::new());
    };

    let entries = parse_front_page(html, &config.selectors, &config.site.base_url)?;
    ctx.stats.posts_discovered(entries.len());

    let mut posts = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(post) = Post::new(entry, &config.archive.root_dir, config.archive.filename_limit)
        else {
            log::debug!("Skipping front page entry without a thread id");
            continue;
        };

        if is_ignored(&post.target_url, &config.archive.ignored_extensions)
            || !is_valid_url(&post.target_url)
        {
            log::debug!("Skipping {}: not archivable", post.target_url);
            continue;
        }

        if ctx.in_flight.contains(&post.folder_path) {
            log::debug!("Already queued: {}", post.folder_path.display());
            continue;
        }

        if !config.archive.revisit_archived && ctx.storage.folder_exists(&post.folder_path).await? {
            log::debug!("Already archived: {}", post.folder_path.display());
            continue;
        }

        posts.push(post);
    }

    Ok(posts)
}
