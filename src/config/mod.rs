//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, budgets, thresholds, sentinels)
//! - The immutable [`CrawlSettings`] threaded through the pipeline
//! - Library [`Config`] and log option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, CrawlSettings, LogFormat, LogLevel};
