//! Tests for CSV export functionality.

use chrono::NaiveDate;
use tempfile::TempDir;

use song_metrics::export::{export_csv, export_path};
use song_metrics::storage::{RecordStore, SqliteRecordStore};
use song_metrics::{ExtractionRecord, Platform};

#[path = "helpers.rs"]
mod helpers;

use helpers::create_test_pool_with_path;

fn record(id: &str, platform: Platform, day: u32, views: i64) -> ExtractionRecord {
    ExtractionRecord {
        song_identity: id.to_string(),
        platform,
        views,
        listeners: -1,
        extracted_date: NaiveDate::from_ymd_opt(2025, 5, day).expect("valid date"),
        upload_date: None,
        source_url: Some(format!("https://example.com/{id}")),
    }
}

fn read_rows(path: &std::path::Path) -> Vec<ExtractionRecord> {
    let mut reader = csv::Reader::from_path(path).expect("open export");
    reader
        .deserialize()
        .collect::<Result<Vec<ExtractionRecord>, _>>()
        .expect("decode export")
}

#[tokio::test]
async fn test_export_writes_platform_file_newest_first() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("metrics.db");
    let pool = create_test_pool_with_path(&db_path).await;
    let store = SqliteRecordStore::new(pool.clone());
    for row in [
        record("a", Platform::YoutubeMusic, 1, 10),
        record("a", Platform::YoutubeMusic, 3, 30),
        record("b", Platform::YoutubeMusic, 2, 20),
        record("a", Platform::Genie, 3, 99),
    ] {
        store.upsert(&row).await.expect("upsert");
    }
    pool.close().await;

    let out = dir.path().join("csv");
    let exported = export_csv(&db_path, &out, "Acme Music", Platform::YoutubeMusic, None)
        .await
        .expect("export");
    assert_eq!(exported, 3);

    let path = export_path(&out, "Acme Music", Platform::YoutubeMusic);
    assert!(path.ends_with("Acme_Music/youtube_music.csv"));
    let rows = read_rows(&path);
    let views: Vec<i64> = rows.iter().map(|r| r.views).collect();
    assert_eq!(views, vec![30, 20, 10]);
    assert!(rows.iter().all(|r| r.platform == Platform::YoutubeMusic));
}

#[tokio::test]
async fn test_export_twice_does_not_duplicate_rows() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("metrics.db");
    let pool = create_test_pool_with_path(&db_path).await;
    let store = SqliteRecordStore::new(pool.clone());
    store
        .upsert(&record("a", Platform::Genie, 1, 10))
        .await
        .expect("upsert");

    let out = dir.path().join("csv");
    export_csv(&db_path, &out, "acme", Platform::Genie, None)
        .await
        .expect("first export");

    // Same-day re-crawl overwrote the stored row
    store
        .upsert(&record("a", Platform::Genie, 1, 15))
        .await
        .expect("upsert");
    pool.close().await;
    export_csv(&db_path, &out, "acme", Platform::Genie, None)
        .await
        .expect("second export");

    let rows = read_rows(&export_path(&out, "acme", Platform::Genie));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].views, 15);
}

#[tokio::test]
async fn test_export_since_filters_older_rows() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("metrics.db");
    let pool = create_test_pool_with_path(&db_path).await;
    let store = SqliteRecordStore::new(pool.clone());
    store
        .upsert(&record("a", Platform::Genie, 1, 10))
        .await
        .expect("upsert");
    store
        .upsert(&record("a", Platform::Genie, 9, 90))
        .await
        .expect("upsert");
    pool.close().await;

    let out = dir.path().join("csv");
    let exported = export_csv(
        &db_path,
        &out,
        "acme",
        Platform::Genie,
        NaiveDate::from_ymd_opt(2025, 5, 5),
    )
    .await
    .expect("export");

    assert_eq!(exported, 1);
    let rows = read_rows(&export_path(&out, "acme", Platform::Genie));
    assert_eq!(rows[0].views, 90);
}

#[tokio::test]
async fn test_export_with_no_rows_creates_no_file() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("metrics.db");
    create_test_pool_with_path(&db_path).await.close().await;

    let out = dir.path().join("csv");
    let exported = export_csv(&db_path, &out, "acme", Platform::Youtube, None)
        .await
        .expect("export");

    assert_eq!(exported, 0);
    assert!(!export_path(&out, "acme", Platform::Youtube).exists());
}
