//! End-to-end crawl tests over scripted browser sessions and in-memory SQLite.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;

use song_metrics::config::{METRIC_EXTRACTION_FAILED, METRIC_NOT_OFFERED};
use song_metrics::error_handling::{OutcomeType, ProcessingStats, RetryType};
use song_metrics::platform::genie_detail_url;
use song_metrics::storage::{record_revision, SqliteRecordStore};
use song_metrics::{
    query_records, run_crawl_with, CrawlSettings, Platform, RecordFilter, SearchTarget,
};

#[path = "helpers.rs"]
mod helpers;

use helpers::{create_test_pool, ScriptedFactory, Site};

const GENIE_HOME: &str = "https://www.genie.co.kr/";
const YTM_HOME: &str = "https://music.youtube.com/";
const VIDEO_URL: &str = "https://www.youtube.com/watch?v=pSUydWEqKwE";

const GENIE_SEARCH: &str = r#"<html><body><input type="search"/></body></html>"#;

const GENIE_RESULTS: &str = r#"<html><body><input type="search"/><table><tbody>
    <tr class="list__item" songid="101"><td class="info"><a class="title">Supernova (Inst.)</a><a class="artist">Cover Band</a></td></tr>
    <tr class="list__item" songid="55"><td class="info"><a class="title">Supernova</a><a class="artist">aespa</a></td></tr>
    </tbody></table></body></html>"#;

const GENIE_UNRELATED: &str = r#"<html><body><input type="search"/><table><tbody>
    <tr class="list__item" songid="9"><td class="info"><a class="title">Hype Boy</a><a class="artist">NewJeans</a></td></tr>
    </tbody></table></body></html>"#;

const GENIE_DETAIL: &str = r#"<html><body><h2 class="name">Supernova</h2>
    <div class="daily-chart"><div class="total"><div><p>48,120</p></div><div><p>1,203,400</p></div></div></div>
    </body></html>"#;

const YTM_SEARCH: &str = r#"<html><body><input id="input"/></body></html>"#;

const YTM_RESULTS: &str = r#"<html><body><input id="input"/>
    <ytmusic-shelf-renderer>
      <ytmusic-responsive-list-item-renderer>
        <yt-formatted-string class="title"><a href="watch?v=JleoAppaxi0">Love wins all</a></yt-formatted-string>
        <div class="secondary-flex-columns">
          <yt-formatted-string class="flex-column" aria-label="IU"><a>IU</a></yt-formatted-string>
          <yt-formatted-string class="flex-column" aria-label="1.5만회 재생">1.5만회</yt-formatted-string>
        </div>
      </ytmusic-responsive-list-item-renderer>
    </ytmusic-shelf-renderer></body></html>"#;

const VIDEO_PAGE: &str = r#"<html><head><meta itemprop="uploadDate" content="2022-12-19"></head><body>
    <h1 class="title">NewJeans (뉴진스) 'Ditto' Official MV</h1>
    <div id="owner"><div id="channel-name"><a>NewJeans</a></div></div>
    <span class="view-count">조회수 1,234,567회</span>
    </body></html>"#;

fn site() -> Site {
    Site::default()
        .page(GENIE_HOME, GENIE_SEARCH)
        .page(&genie_detail_url("55"), GENIE_DETAIL)
        .page(YTM_HOME, YTM_SEARCH)
        .page(VIDEO_URL, VIDEO_PAGE)
        .results("aespa Supernova", GENIE_RESULTS)
        .results("IU Love wins all", YTM_RESULTS)
        .results("Nobody Unknown Song", GENIE_UNRELATED)
        .empty_results(GENIE_SEARCH)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date")
}

fn targets() -> Vec<SearchTarget> {
    let mut anonymous = SearchTarget::new("", Platform::Genie, "aespa", "Supernova");
    anonymous.song_identity = None;
    vec![
        SearchTarget::new("1042", Platform::Genie, "aespa", "Supernova"),
        SearchTarget::new("2001", Platform::YoutubeMusic, "IU", "Love wins all"),
        SearchTarget::new("3003", Platform::Youtube, "NewJeans", "Ditto").with_url(VIDEO_URL),
        SearchTarget::new("4004", Platform::Genie, "Nobody", "Unknown Song"),
        anonymous,
    ]
}

#[tokio::test]
async fn test_mixed_platform_crawl_records_expected_rows() {
    let pool = Arc::new(create_test_pool().await);
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    let factory = ScriptedFactory::new(site());
    let stats = ProcessingStats::new();
    let settings = CrawlSettings::immediate();

    let report = run_crawl_with(&factory, &store, &settings, &stats, targets(), 1, day()).await;

    assert_eq!(report.total, 5);
    assert_eq!(report.persisted, 3);
    assert_eq!(report.created, 3);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.failed, 0);

    // One session per platform, each released
    assert_eq!(factory.log.acquired.load(Ordering::SeqCst), 3);
    assert_eq!(factory.log.released.load(Ordering::SeqCst), 3);

    let genie = query_records(
        &pool,
        &RecordFilter {
            platform: Some(Platform::Genie),
            ..Default::default()
        },
    )
    .await
    .expect("genie rows");
    assert_eq!(genie.len(), 1);
    assert_eq!(genie[0].song_identity, "1042");
    assert_eq!(genie[0].listeners, 48_120);
    assert_eq!(genie[0].views, 1_203_400);
    assert_eq!(genie[0].extracted_date, day());

    let ytm = query_records(
        &pool,
        &RecordFilter {
            platform: Some(Platform::YoutubeMusic),
            ..Default::default()
        },
    )
    .await
    .expect("ytm rows");
    assert_eq!(ytm[0].views, 15_000);
    assert_eq!(ytm[0].listeners, METRIC_NOT_OFFERED);
    assert_eq!(
        ytm[0].source_url.as_deref(),
        Some("https://music.youtube.com/watch?v=JleoAppaxi0")
    );

    let youtube = query_records(
        &pool,
        &RecordFilter {
            platform: Some(Platform::Youtube),
            ..Default::default()
        },
    )
    .await
    .expect("youtube rows");
    assert_eq!(youtube[0].views, 1_234_567);
    assert_eq!(youtube[0].listeners, METRIC_NOT_OFFERED);
    assert_eq!(youtube[0].upload_date, NaiveDate::from_ymd_opt(2022, 12, 19));
    assert_eq!(youtube[0].source_url.as_deref(), Some(VIDEO_URL));
}

#[tokio::test]
async fn test_unmatched_target_uses_full_match_budget() {
    let pool = Arc::new(create_test_pool().await);
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    let factory = ScriptedFactory::new(site());
    let stats = ProcessingStats::new();
    let settings = CrawlSettings::immediate();
    let target = SearchTarget::new("4004", Platform::Genie, "Nobody", "Unknown Song");

    let report = run_crawl_with(&factory, &store, &settings, &stats, vec![target], 1, day()).await;

    assert_eq!(report.not_found, 1);
    assert_eq!(
        factory.log.submits.load(Ordering::SeqCst),
        settings.match_attempts as usize
    );
    assert_eq!(
        stats.get_retry_count(RetryType::NoMatch),
        settings.match_attempts as usize - 1
    );
    assert_eq!(stats.get_outcome_count(OutcomeType::NotFound), 1);
    assert!(query_records(&pool, &RecordFilter::default())
        .await
        .expect("rows")
        .is_empty());
}

#[tokio::test]
async fn test_rerun_same_day_overwrites_instead_of_duplicating() {
    let pool = Arc::new(create_test_pool().await);
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    let factory = ScriptedFactory::new(site());
    let settings = CrawlSettings::immediate();
    let target = SearchTarget::new("1042", Platform::Genie, "aespa", "Supernova");

    for _ in 0..2 {
        let stats = ProcessingStats::new();
        run_crawl_with(&factory, &store, &settings, &stats, vec![target.clone()], 1, day()).await;
    }

    let rows = query_records(&pool, &RecordFilter::default())
        .await
        .expect("rows");
    assert_eq!(rows.len(), 1);
    let revision = record_revision(&pool, "1042", Platform::Genie, day())
        .await
        .expect("revision");
    assert_eq!(revision, Some(1));
}

#[tokio::test]
async fn test_missing_detail_page_is_stored_as_extraction_failed() {
    let pool = Arc::new(create_test_pool().await);
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    // Same site without the detail page
    let factory = ScriptedFactory::new(
        Site::default()
            .page(GENIE_HOME, GENIE_SEARCH)
            .results("aespa Supernova", GENIE_RESULTS)
            .empty_results(GENIE_SEARCH),
    );
    let stats = ProcessingStats::new();
    let target = SearchTarget::new("1042", Platform::Genie, "aespa", "Supernova");

    let report = run_crawl_with(
        &factory,
        &store,
        &CrawlSettings::immediate(),
        &stats,
        vec![target],
        1,
        day(),
    )
    .await;

    assert_eq!(report.persisted, 1);
    let rows = query_records(&pool, &RecordFilter::default())
        .await
        .expect("rows");
    assert_eq!(rows[0].views, METRIC_EXTRACTION_FAILED);
    assert_eq!(rows[0].listeners, METRIC_EXTRACTION_FAILED);
}

#[tokio::test]
async fn test_sessions_split_work_and_all_release() {
    let pool = Arc::new(create_test_pool().await);
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    let factory = ScriptedFactory::new(site());
    let stats = ProcessingStats::new();
    let targets: Vec<SearchTarget> = (0..6)
        .map(|i| SearchTarget::new(format!("g-{i}"), Platform::Genie, "aespa", "Supernova"))
        .collect();

    let report = run_crawl_with(
        &factory,
        &store,
        &CrawlSettings::immediate(),
        &stats,
        targets,
        3,
        day(),
    )
    .await;

    assert_eq!(report.persisted, 6);
    assert_eq!(factory.log.acquired.load(Ordering::SeqCst), 3);
    assert_eq!(factory.log.released.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unreachable_webdriver_fails_batch_without_panicking() {
    let pool = Arc::new(create_test_pool().await);
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    let factory = ScriptedFactory::refusing();
    let stats = ProcessingStats::new();

    let report = run_crawl_with(
        &factory,
        &store,
        &CrawlSettings::immediate(),
        &stats,
        targets(),
        2,
        day(),
    )
    .await;

    assert_eq!(report.total, 5);
    assert_eq!(report.failed, 5);
    assert_eq!(report.persisted, 0);
}
