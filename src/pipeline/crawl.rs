// src/pipeline/crawl.rs

//! Archiver driver.
//!
//! Wires the poller to the two worker pools and runs the shutdown protocol:
//! stop the poller, let the post workers drain their queue, which closes the
//! comment queue, let the comment workers drain, then join everything.

use tokio::task::{JoinError, JoinSet};

use crate::error::{AppError, Result};
use crate::pipeline::comments::run_comment_worker;
use crate::pipeline::context::{CrawlContext, work_queue};
use crate::pipeline::discovery::{PollMode, run_poller};
use crate::pipeline::posts::run_post_worker;
use crate::pipeline::stats::StatsSnapshot;

/// Run the archiver until shutdown (or after one cycle in [`PollMode::Once`]).
pub async fn run_archiver(ctx: CrawlContext, mode: PollMode) -> Result<StatsSnapshot> {
    let crawler = &ctx.config.crawler;

    ctx.storage.ensure_folder(&ctx.config.archive.root_dir).await?;
    log::info!(
        "Archiving into {} with {} post workers and {} comment workers",
        ctx.config.archive.root_dir.display(),
        crawler.post_workers,
        crawler.comment_workers
    );

    let (post_tx, post_rx) = work_queue(crawler.queue_capacity);
    let (comment_tx, comment_rx) = work_queue(crawler.queue_capacity);

    let mut workers = JoinSet::new();
    for id in 0..crawler.comment_workers {
        workers.spawn(run_comment_worker(id, ctx.clone(), comment_rx.clone()));
    }
    for id in 0..crawler.post_workers {
        workers.spawn(run_post_worker(
            id,
            ctx.clone(),
            post_rx.clone(),
            comment_tx.clone(),
        ));
    }
    // Workers hold the only remaining handles, so queues close as they finish.
    drop(post_rx);
    drop(comment_rx);
    drop(comment_tx);

    let mut poller = tokio::spawn(run_poller(ctx.clone(), post_tx, mode));
    let mut fatal: Option<AppError> = None;

    // Workers only run out of work after the poller dropped its sender, so a
    // clean exit here is normal. Errors and panics are not.
    let poller_result = loop {
        tokio::select! {
            result = &mut poller => break result,
            Some(joined) = workers.join_next() => {
                if let Some(e) = worker_failure(joined) {
                    log::error!("Worker failure, shutting down: {e}");
                    ctx.shutdown.cancel();
                    fatal.get_or_insert(e);
                }
            }
        }
    };

    match poller_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            log::error!("Poller failed, shutting down: {e}");
            ctx.shutdown.cancel();
            fatal.get_or_insert(e);
        }
        Err(e) => {
            log::error!("Poller task failed, shutting down: {e}");
            ctx.shutdown.cancel();
            fatal.get_or_insert(AppError::task(e));
        }
    }

    log::info!("Draining work queues");
    while let Some(joined) = workers.join_next().await {
        if let Some(e) = worker_failure(joined) {
            log::error!("Worker failed: {e}");
            fatal.get_or_insert(e);
        }
    }

    let stats = ctx.stats.snapshot();
    stats.log_summary("Archiver stopped");

    match fatal {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}

fn worker_failure(joined: std::result::Result<Result<()>, JoinError>) -> Option<AppError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(e) => Some(AppError::task(e)),
    }
}
