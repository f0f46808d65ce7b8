// src/lib.rs

//! Front page archiver library.
//!
//! Polls an aggregator's front page, archives each new post's target page
//! and every page linked from its comments into one folder per post.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
