//! Processing statistics tracking.
//!
//! Thread-safe counters for target outcomes, retries, and sentinel
//! substitutions, shared across independent pipelines.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::{OutcomeType, RetryType, SentinelType};

/// Thread-safe processing statistics tracker.
///
/// Every enum variant is registered with a zero counter on creation, so
/// increments never allocate. Share across pipelines with `Arc`.
pub struct ProcessingStats {
    outcomes: HashMap<OutcomeType, AtomicUsize>,
    retries: HashMap<RetryType, AtomicUsize>,
    sentinels: HashMap<SentinelType, AtomicUsize>,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        ProcessingStats {
            outcomes: OutcomeType::iter()
                .map(|o| (o, AtomicUsize::new(0)))
                .collect(),
            retries: RetryType::iter().map(|r| (r, AtomicUsize::new(0))).collect(),
            sentinels: SentinelType::iter()
                .map(|s| (s, AtomicUsize::new(0)))
                .collect(),
        }
    }

    pub fn increment_outcome(&self, outcome: OutcomeType) {
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment outcome counter for {:?} which is not in the map",
                outcome
            );
        }
    }

    pub fn increment_retry(&self, retry: RetryType) {
        if let Some(counter) = self.retries.get(&retry) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment retry counter for {:?} which is not in the map",
                retry
            );
        }
    }

    pub fn increment_sentinel(&self, sentinel: SentinelType) {
        if let Some(counter) = self.sentinels.get(&sentinel) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment sentinel counter for {:?} which is not in the map",
                sentinel
            );
        }
    }

    pub fn get_outcome_count(&self, outcome: OutcomeType) -> usize {
        self.outcomes
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn get_retry_count(&self, retry: RetryType) -> usize {
        self.retries
            .get(&retry)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn get_sentinel_count(&self, sentinel: SentinelType) -> usize {
        self.sentinels
            .get(&sentinel)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn total_retries(&self) -> usize {
        self.retries.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Targets that produced no stored row (not found or rejected).
    pub fn total_skipped(&self) -> usize {
        self.get_outcome_count(OutcomeType::NotFound) + self.get_outcome_count(OutcomeType::Rejected)
    }

    /// Logs every non-zero counter.
    pub fn log_summary(&self) {
        for outcome in OutcomeType::iter() {
            let count = self.get_outcome_count(outcome);
            if count > 0 {
                log::info!("{}: {}", outcome, count);
            }
        }
        for retry in RetryType::iter() {
            let count = self.get_retry_count(retry);
            if count > 0 {
                log::info!("Retry - {}: {}", retry, count);
            }
        }
        for sentinel in SentinelType::iter() {
            let count = self.get_sentinel_count(sentinel);
            if count > 0 {
                log::info!("{}: {}", sentinel, count);
            }
        }
    }
}
