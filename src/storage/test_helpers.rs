//! Shared test helpers for storage module tests.

#[cfg(test)]
use chrono::NaiveDate;
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::models::{ExtractionRecord, Platform};
#[cfg(test)]
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A record extracted on 2025-01-15 with the given metrics.
#[cfg(test)]
pub fn sample_record(
    song_identity: &str,
    platform: Platform,
    views: i64,
    listeners: i64,
) -> ExtractionRecord {
    ExtractionRecord {
        song_identity: song_identity.to_string(),
        platform,
        views,
        listeners,
        extracted_date: NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date"),
        upload_date: None,
        source_url: None,
    }
}
