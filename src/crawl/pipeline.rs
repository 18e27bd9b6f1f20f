//! Per-target pipeline: search, collect, validate, persist.

use chrono::NaiveDate;

use crate::browser::BrowserSession;
use crate::config::{CrawlSettings, METRIC_EXTRACTION_FAILED, METRIC_NOT_OFFERED};
use crate::crawl::controller::{SearchController, SearchOutcome};
use crate::error_handling::{OutcomeType, ProcessingStats, SentinelType};
use crate::models::{ExtractionRecord, RawRecord, SearchTarget, TargetOutcome, UpsertOutcome};
use crate::platform::PlatformAdapter;
use crate::storage::RecordStore;
use crate::validate::validate;

/// Everything one shard needs to process targets for one platform.
pub struct Pipeline<'a> {
    pub adapter: &'a dyn PlatformAdapter,
    pub store: &'a dyn RecordStore,
    pub settings: &'a CrawlSettings,
    pub stats: &'a ProcessingStats,
    /// Date stamped on every record this pipeline writes.
    pub extracted_date: NaiveDate,
}

impl Pipeline<'_> {
    /// Runs one target to completion. "Not found" and rejected records are
    /// ordinary outcomes, not errors.
    pub async fn process_target(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
    ) -> TargetOutcome {
        let controller = SearchController::new(self.settings, self.stats);
        let (candidate, match_result, attempts) =
            match controller.run(session, self.adapter, target).await {
                SearchOutcome::Confirmed {
                    candidate,
                    match_result,
                    attempts,
                } => (candidate, match_result, attempts),
                SearchOutcome::Exhausted { attempts } => {
                    self.stats.increment_outcome(OutcomeType::NotFound);
                    log::warn!(
                        "Not found: {} on {} after {} attempt(s)",
                        target.label(),
                        target.platform,
                        attempts
                    );
                    return TargetOutcome::NotFound { attempts };
                }
            };

        self.stats.increment_outcome(OutcomeType::Matched);
        log::debug!(
            "Matched {} to '{}' / '{}' ({}) after {} attempt(s)",
            target.label(),
            candidate.artist,
            candidate.title,
            match_result.match_type.as_str(),
            attempts
        );

        let metrics = self
            .adapter
            .collect_metrics(session, target, &candidate, self.settings)
            .await;
        let raw = RawRecord::from_metrics(target, metrics, self.extracted_date);

        let record = match validate(raw) {
            Ok(record) => record,
            Err(reason) => {
                self.stats.increment_outcome(OutcomeType::Rejected);
                log::warn!("Skipped {} on {}: {}", target.label(), target.platform, reason);
                return TargetOutcome::Rejected(reason);
            }
        };
        self.count_sentinels(&record);

        match self.store.upsert(&record).await {
            Ok(outcome) => {
                self.stats.increment_outcome(match outcome {
                    UpsertOutcome::Created => OutcomeType::PersistedCreated,
                    UpsertOutcome::Updated => OutcomeType::PersistedUpdated,
                });
                log::info!(
                    "Stored {} on {}: views={} listeners={} ({:?})",
                    target.label(),
                    record.platform,
                    record.views,
                    record.listeners,
                    outcome
                );
                TargetOutcome::Persisted { record, outcome }
            }
            Err(e) => {
                self.stats.increment_outcome(OutcomeType::PersistFailed);
                log::error!("Failed to store {} on {}: {e}", target.label(), record.platform);
                TargetOutcome::StoreFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn count_sentinels(&self, record: &ExtractionRecord) {
        for value in [record.views, record.listeners] {
            match value {
                METRIC_NOT_OFFERED => self.stats.increment_sentinel(SentinelType::NotOffered),
                METRIC_EXTRACTION_FAILED => {
                    self.stats.increment_sentinel(SentinelType::ExtractionFailed)
                }
                _ => {}
            }
        }
    }
}
