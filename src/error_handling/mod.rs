//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error types for collaborator failures (browser, database, input, export)
//! - Processing statistics tracking (outcomes, retries, sentinel substitutions)
//! - The retry strategy used when acquiring browser sessions
//!
//! Ordinary "not found" results are never errors; they are counted as
//! [`OutcomeType::NotFound`] and reported as skipped items.

mod stats;
mod types;

use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    BrowserError, DatabaseError, ExportError, InitializationError, OutcomeType, RetryType,
    SentinelType, TargetInputError,
};

/// Retry strategy for WebDriver session creation.
///
/// Exponential backoff starting at `SESSION_RETRY_INITIAL_DELAY_MS`, capped at
/// `SESSION_RETRY_MAX_DELAY_SECS`, limited to `SESSION_RETRY_MAX_ATTEMPTS` delays.
pub fn get_session_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::SESSION_RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::SESSION_RETRY_FACTOR)
        .max_delay(Duration::from_secs(
            crate::config::SESSION_RETRY_MAX_DELAY_SECS,
        ))
        .take(crate::config::SESSION_RETRY_MAX_ATTEMPTS)
}
