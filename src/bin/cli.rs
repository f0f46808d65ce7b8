//! Front page archiver CLI
//!
//! Long-running entry point. Ctrl+C or SIGTERM stops polling, drains the
//! work queues and exits. A second interrupt exits without draining.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hn_archiver::{
    error::Result,
    models::Config,
    pipeline::{self, CrawlContext, PollMode},
};
use tokio_util::sync::CancellationToken;

/// Archive front page posts and the pages linked from their comments
#[derive(Parser, Debug)]
#[command(name = "hn-archiver", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "archiver.toml")]
    config: PathBuf,

    /// Archive root directory (overrides archive.root_dir)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Seconds between front page polls (overrides crawler.poll_interval_secs)
    #[arg(long)]
    interval: Option<u64>,

    /// Fetch timeout in seconds (overrides crawler.timeout_secs)
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the front page until interrupted (default)
    Run,

    /// Run a single discovery cycle, drain the queues and exit
    Once,

    /// Validate configuration and print the effective values
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Apply command line overrides on top of the file configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(root) = &cli.root {
        config.archive.root_dir = root.clone();
    }
    if let Some(interval) = cli.interval {
        config.crawler.poll_interval_secs = interval;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.timeout_secs = timeout;
    }
}

/// Resolve on Ctrl+C or SIGTERM.
async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Cancel `token` on the first interrupt and return on the second.
///
/// Returning means the operator gave up on the drain.
async fn watch_signals<F, Fut>(token: CancellationToken, mut interrupt: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::select! {
        () = interrupt() => {
            log::info!("Interrupt received, finishing in-flight work (interrupt again to exit now)");
            token.cancel();
        }
        () = token.cancelled() => {}
    }

    interrupt().await;
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Archiver starting...");

    let mut config = Config::load_or_default(&cli.config);
    apply_overrides(&mut config, &cli);

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let mode = match cli.command {
        Some(Command::Validate) => {
            log::info!("✓ Config OK");
            log::info!("    front page: {}", config.front_page_url());
            log::info!("    archive root: {}", config.archive.root_dir.display());
            log::info!(
                "    poll every {}s, fetch timeout {}s",
                config.crawler.poll_interval_secs,
                config.crawler.timeout_secs
            );
            log::info!(
                "    workers: {} post, {} comment; queue capacity {}",
                config.crawler.post_workers,
                config.crawler.comment_workers,
                config.crawler.queue_capacity
            );
            log::info!(
                "    ignored extensions: {}",
                config.archive.ignored_extensions.join(", ")
            );
            return Ok(());
        }
        Some(Command::Once) => PollMode::Once,
        Some(Command::Run) | None => PollMode::Forever,
    };

    let ctx = CrawlContext::from_config(config)?;
    let mut signals = tokio::spawn(watch_signals(ctx.shutdown.clone(), interrupted));

    let result = tokio::select! {
        result = pipeline::run_archiver(ctx.clone(), mode) => result,
        _ = &mut signals => {
            log::warn!("Second interrupt, exiting without draining");
            std::process::exit(130);
        }
    };
    signals.abort();

    match result {
        Ok(_) => {
            log::info!("Done!");
            Ok(())
        }
        Err(e) => {
            log::error!("Archiver stopped with an error: {e}");
            Err(e)
        }
    }
}
