//! Extraction record persistence.
//!
//! Rows are keyed by `(song_identity, platform, extracted_date)`. Writing the
//! same key twice overwrites the metrics and bumps `revision`, so a re-run on
//! the same day replaces data instead of duplicating it.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{ExtractionRecord, Platform, UpsertOutcome};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keyed, idempotent record writes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts the record, or overwrites the row with the same key.
    async fn upsert(&self, record: &ExtractionRecord) -> Result<UpsertOutcome, DatabaseError>;
}

/// [`RecordStore`] over the SQLite `extraction_records` table.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: Arc<SqlitePool>,
}

impl SqliteRecordStore {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn upsert(&self, record: &ExtractionRecord) -> Result<UpsertOutcome, DatabaseError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let revision: i64 = sqlx::query_scalar(
            "INSERT INTO extraction_records (
                song_identity, platform, views, listeners, extracted_date,
                upload_date, source_url, revision, created_at_ms, updated_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT(song_identity, platform, extracted_date) DO UPDATE SET
                views = excluded.views,
                listeners = excluded.listeners,
                upload_date = excluded.upload_date,
                source_url = excluded.source_url,
                revision = extraction_records.revision + 1,
                updated_at_ms = excluded.updated_at_ms
            RETURNING revision",
        )
        .bind(&record.song_identity)
        .bind(record.platform.as_str())
        .bind(record.views)
        .bind(record.listeners)
        .bind(record.extracted_date.format(DATE_FORMAT).to_string())
        .bind(record.upload_date.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(&record.source_url)
        .bind(now_ms)
        .bind(now_ms)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(if revision == 0 {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }
}

/// Optional filters for [`query_records`].
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub platform: Option<Platform>,
    pub song_identity: Option<String>,
    /// Only records extracted on or after this date.
    pub since: Option<NaiveDate>,
}

fn parse_date(column: &'static str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DatabaseError::InvalidValue {
        column,
        value: value.to_string(),
    })
}

fn record_from_row(row: &SqliteRow) -> Result<ExtractionRecord, DatabaseError> {
    let platform: String = row.try_get("platform")?;
    let extracted_date: String = row.try_get("extracted_date")?;
    let upload_date: Option<String> = row.try_get("upload_date")?;

    Ok(ExtractionRecord {
        song_identity: row.try_get("song_identity")?,
        platform: Platform::from_str(&platform).map_err(|_| DatabaseError::InvalidValue {
            column: "platform",
            value: platform.clone(),
        })?,
        views: row.try_get("views")?,
        listeners: row.try_get("listeners")?,
        extracted_date: parse_date("extracted_date", &extracted_date)?,
        upload_date: upload_date
            .as_deref()
            .map(|d| parse_date("upload_date", d))
            .transpose()?,
        source_url: row.try_get("source_url")?,
    })
}

/// Stored records matching `filter`, newest extraction date first.
pub async fn query_records(
    pool: &SqlitePool,
    filter: &RecordFilter,
) -> Result<Vec<ExtractionRecord>, DatabaseError> {
    let mut query_builder = sqlx::QueryBuilder::new(
        "SELECT song_identity, platform, views, listeners, extracted_date,
                upload_date, source_url
         FROM extraction_records WHERE 1 = 1",
    );
    if let Some(platform) = filter.platform {
        query_builder.push(" AND platform = ");
        query_builder.push_bind(platform.as_str());
    }
    if let Some(song_identity) = &filter.song_identity {
        query_builder.push(" AND song_identity = ");
        query_builder.push_bind(song_identity.clone());
    }
    if let Some(since) = filter.since {
        query_builder.push(" AND extracted_date >= ");
        query_builder.push_bind(since.format(DATE_FORMAT).to_string());
    }
    query_builder.push(" ORDER BY extracted_date DESC, song_identity ASC");

    let rows = query_builder.build().fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

/// Current revision of one row, `None` when it does not exist.
pub async fn record_revision(
    pool: &SqlitePool,
    song_identity: &str,
    platform: Platform,
    extracted_date: NaiveDate,
) -> Result<Option<i64>, DatabaseError> {
    let revision = sqlx::query_scalar(
        "SELECT revision FROM extraction_records
         WHERE song_identity = ? AND platform = ? AND extracted_date = ?",
    )
    .bind(song_identity)
    .bind(platform.as_str())
    .bind(extracted_date.format(DATE_FORMAT).to_string())
    .fetch_optional(pool)
    .await?;
    Ok(revision)
}
