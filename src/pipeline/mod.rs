//! Pipeline entry points for archiver operations.
//!
//! - `run_archiver`: poller, post worker pool and comment worker pool
//! - `poll_once`: a single discovery cycle
//! - `process_post` / `process_comment`: one queue item each

pub mod comments;
pub mod context;
pub mod crawl;
pub mod discovery;
pub mod posts;
pub mod stats;

pub use comments::process_comment;
pub use context::{CrawlContext, InFlight, SharedReceiver, work_queue};
pub use crawl::run_archiver;
pub use discovery::{PollMode, discover, poll_once};
pub use posts::process_post;
pub use stats::{CrawlStats, StatsSnapshot};
