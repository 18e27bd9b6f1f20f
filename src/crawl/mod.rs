//! Crawl orchestration.
//!
//! Targets are grouped by platform, each group is split across independent
//! browser sessions, and every session works through its share sequentially:
//!
//! ```text
//! run_crawl
//!   └─ per platform: shard targets over `sessions` pipelines
//!        └─ run_batch: acquire session → process_target* → release
//!             └─ SearchController → collect_metrics → validate → upsert
//! ```

pub mod backoff;
pub mod controller;
pub mod pipeline;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{error, info, warn};

use crate::browser::SessionFactory;
use crate::config::{Config, CrawlSettings};
use crate::error_handling::{BrowserError, ProcessingStats};
use crate::initialization::init_session_factory;
use crate::models::{ExtractionRecord, Platform, SearchTarget, TargetOutcome, UpsertOutcome};
use crate::platform::{adapter_for, PlatformAdapter};
use crate::storage::{init_db_pool_with_path, run_migrations, RecordStore, SqliteRecordStore};

pub use backoff::{pause, random_delay};
pub use controller::{SearchController, SearchOutcome, SearchState};
pub use pipeline::Pipeline;

/// Platforms in the order their groups are scheduled.
const PLATFORM_ORDER: [Platform; 3] = [Platform::Genie, Platform::YoutubeMusic, Platform::Youtube];

/// Summary of a crawl run.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Targets handed to the crawl
    pub total: usize,
    /// Records written (created + updated)
    pub persisted: usize,
    /// New rows
    pub created: usize,
    /// Same-day rows overwritten
    pub updated: usize,
    /// Targets whose attempt budget ran out
    pub not_found: usize,
    /// Records dropped by the validator
    pub rejected: usize,
    /// Store failures plus targets whose batch never got a session
    pub failed: usize,
    /// Every record written during the run, for CSV export
    pub records: Vec<ExtractionRecord>,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

impl CrawlReport {
    fn record(&mut self, outcome: TargetOutcome) {
        match outcome {
            TargetOutcome::Persisted { record, outcome } => {
                self.persisted += 1;
                match outcome {
                    UpsertOutcome::Created => self.created += 1,
                    UpsertOutcome::Updated => self.updated += 1,
                }
                self.records.push(record);
            }
            TargetOutcome::NotFound { .. } => self.not_found += 1,
            TargetOutcome::Rejected(_) => self.rejected += 1,
            TargetOutcome::StoreFailed { .. } => self.failed += 1,
        }
    }

    /// Targets skipped as ordinary outcomes (not found or rejected).
    pub fn skipped(&self) -> usize {
        self.not_found + self.rejected
    }
}

/// Runs `targets` through one freshly acquired session.
///
/// The session is released whatever happens to the individual targets. Only
/// a failure to acquire the session is returned as an error.
pub async fn run_batch(
    factory: &dyn SessionFactory,
    pipeline: &Pipeline<'_>,
    targets: &[SearchTarget],
) -> Result<Vec<TargetOutcome>, BrowserError> {
    let mut session = factory.acquire().await?;
    let mut outcomes = Vec::with_capacity(targets.len());

    for target in targets {
        outcomes.push(pipeline.process_target(session.as_mut(), target).await);
    }

    if let Err(e) = session.release().await {
        warn!(
            "Failed to release {} session: {e}",
            pipeline.adapter.platform()
        );
    }
    Ok(outcomes)
}

/// Splits `targets` round-robin into at most `shards` non-empty groups.
fn shard(targets: Vec<SearchTarget>, shards: usize) -> Vec<Vec<SearchTarget>> {
    let shards = shards.max(1).min(targets.len().max(1));
    let mut groups: Vec<Vec<SearchTarget>> = (0..shards).map(|_| Vec::new()).collect();
    for (i, target) in targets.into_iter().enumerate() {
        groups[i % shards].push(target);
    }
    groups.retain(|group| !group.is_empty());
    groups
}

/// Crawls `targets` with sessions from `factory`, writing through `store`.
///
/// Every platform group is split over `sessions` pipelines; all pipelines of
/// all platforms run concurrently. A batch whose session cannot be acquired
/// is logged and its targets are counted as failed.
pub async fn run_crawl_with(
    factory: &dyn SessionFactory,
    store: &dyn RecordStore,
    settings: &CrawlSettings,
    stats: &ProcessingStats,
    targets: Vec<SearchTarget>,
    sessions: usize,
    extracted_date: NaiveDate,
) -> CrawlReport {
    let start_time = Instant::now();
    let mut report = CrawlReport {
        total: targets.len(),
        ..Default::default()
    };

    let mut by_platform: HashMap<Platform, Vec<SearchTarget>> = HashMap::new();
    for target in targets {
        by_platform.entry(target.platform).or_default().push(target);
    }

    let plan: Vec<(Box<dyn PlatformAdapter>, Vec<Vec<SearchTarget>>)> = PLATFORM_ORDER
        .into_iter()
        .filter_map(|platform| {
            by_platform.remove(&platform).map(|group| {
                info!(
                    "{}: {} target(s) over up to {} session(s)",
                    platform,
                    group.len(),
                    sessions.max(1)
                );
                (adapter_for(platform), shard(group, sessions))
            })
        })
        .collect();

    let mut batches = FuturesUnordered::new();
    for (adapter, shards) in &plan {
        for targets in shards {
            let pipeline = Pipeline {
                adapter: adapter.as_ref(),
                store,
                settings,
                stats,
                extracted_date,
            };
            batches.push(async move {
                let result = run_batch(factory, &pipeline, targets).await;
                (pipeline.adapter.platform(), targets.len(), result)
            });
        }
    }

    while let Some((platform, batch_len, result)) = batches.next().await {
        match result {
            Ok(outcomes) => {
                for outcome in outcomes {
                    report.record(outcome);
                }
            }
            Err(e) => {
                error!("{platform} batch of {batch_len} target(s) abandoned: {e}");
                report.failed += batch_len;
            }
        }
    }

    report.elapsed_seconds = start_time.elapsed().as_secs_f64();
    report
}

/// Runs a full crawl with the provided configuration.
///
/// Opens (and migrates) the database at `config.db_path`, connects to the
/// WebDriver endpoint, crawls every target, and, when an export destination
/// is configured, appends the written records to the per-platform CSV files.
///
/// # Errors
///
/// Returns an error if the database or the WebDriver client cannot be
/// initialized, or if the CSV export fails. Targets that are not found or are
/// rejected are counted in the report, never returned as errors.
pub async fn run_crawl(
    config: &Config,
    targets: Vec<SearchTarget>,
    extracted_date: NaiveDate,
) -> Result<CrawlReport> {
    let pool = init_db_pool_with_path(&config.db_path)
        .await
        .context("Failed to initialize database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    let store = SqliteRecordStore::new(Arc::clone(&pool));
    let factory =
        init_session_factory(config).context("Failed to initialize WebDriver client")?;
    let stats = ProcessingStats::new();

    info!(
        "Starting crawl of {} target(s) for {}",
        targets.len(),
        extracted_date
    );
    let report = run_crawl_with(
        factory.as_ref(),
        &store,
        &config.settings,
        &stats,
        targets,
        config.sessions,
        extracted_date,
    )
    .await;

    stats.log_summary();

    if let Some(destination) = &config.export_destination {
        for platform in PLATFORM_ORDER {
            let rows: Vec<ExtractionRecord> = report
                .records
                .iter()
                .filter(|record| record.platform == platform)
                .cloned()
                .collect();
            if rows.is_empty() {
                continue;
            }
            let path =
                crate::export::append_records(&config.export_dir, destination, platform, &rows)
                    .with_context(|| format!("Failed to export {platform} records"))?;
            info!("Exported {} {} record(s) to {}", rows.len(), platform, path.display());
        }
    }

    if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(pool.as_ref())
        .await
    {
        warn!("Failed to checkpoint WAL file (this is non-critical): {}", e);
    }
    pool.close().await;

    Ok(report)
}
