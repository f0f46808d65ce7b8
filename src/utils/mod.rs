//! Utility functions and helpers.

pub mod filename;
pub mod http;
pub mod url;

pub use self::filename::sanitize_filename;
pub use self::url::{extract_thread_id, is_ignored, is_valid_url, resolve};
