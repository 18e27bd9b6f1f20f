//! Search-retry controller.
//!
//! Drives one target through a platform's search surface until a candidate is
//! confirmed or the attempt budgets run out:
//!
//! ```text
//! Idle -> Querying -> AwaitingResults -> Matching -> Confirmed
//!            ^              |               |
//!            |              v               v
//!            +--------- Retrying <----------+
//!                           |
//!                           v
//!                       Exhausted
//! ```
//!
//! Two failure classes have separate budgets. Submission failures (search box
//! missing, results never rendered) usually mean the layout changed and are
//! given up on sooner. Match failures (results rendered but nothing matched,
//! markup unreadable) get more tries, since a refresh often surfaces a
//! different result list. Every retry refreshes the page and waits a random
//! backoff first.

use scraper::Html;

use crate::browser::{wait_for_any, BrowserSession};
use crate::config::CrawlSettings;
use crate::crawl::backoff::pause;
use crate::error_handling::{ProcessingStats, RetryType};
use crate::matching::{MatchEngine, MatchResult, MatchType};
use crate::models::{Candidate, SearchTarget};
use crate::normalize::NormalizedPair;
use crate::platform::{PageMode, PlatformAdapter, Submission};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Querying,
    AwaitingResults,
    Matching,
    Retrying(RetryType),
    Confirmed,
    Exhausted,
}

/// Final result of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Confirmed {
        candidate: Candidate,
        match_result: MatchResult,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
    },
}

impl SearchOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            SearchOutcome::Confirmed { attempts, .. } | SearchOutcome::Exhausted { attempts } => {
                *attempts
            }
        }
    }
}

fn is_submission_failure(kind: RetryType) -> bool {
    matches!(kind, RetryType::SubmissionFailed | RetryType::ResultsTimeout)
}

pub struct SearchController<'a> {
    settings: &'a CrawlSettings,
    stats: &'a ProcessingStats,
}

impl<'a> SearchController<'a> {
    pub fn new(settings: &'a CrawlSettings, stats: &'a ProcessingStats) -> Self {
        Self { settings, stats }
    }

    /// Runs the state machine for one target. Never fails: collaborator
    /// errors are treated as failed attempts.
    pub async fn run(
        &self,
        session: &mut dyn BrowserSession,
        adapter: &dyn PlatformAdapter,
        target: &SearchTarget,
    ) -> SearchOutcome {
        let settings = self.settings;
        let mut state = SearchState::Idle;
        let mut attempts: u32 = 0;
        let mut submission_failures: u32 = 0;
        let mut match_failures: u32 = 0;
        let mut confirmed: Option<(Candidate, MatchResult)> = None;
        let mut entered = adapter.entry_url().is_none();

        loop {
            log::trace!("{} [{}]: {:?}", target.label(), adapter.platform(), state);
            state = match state {
                SearchState::Idle => match adapter.entry_url() {
                    Some(url) => match session.navigate(url).await {
                        Ok(()) => {
                            entered = true;
                            SearchState::Querying
                        }
                        Err(e) => {
                            log::warn!("Could not open {}: {e}", url);
                            attempts += 1;
                            SearchState::Retrying(RetryType::SubmissionFailed)
                        }
                    },
                    None => SearchState::Querying,
                },

                SearchState::Querying => {
                    attempts += 1;
                    match adapter.submit_query(session, target, settings).await {
                        Ok(Submission::Submitted) => SearchState::AwaitingResults,
                        Ok(Submission::Failed) => {
                            SearchState::Retrying(RetryType::SubmissionFailed)
                        }
                        Ok(Submission::Unsupported) => SearchState::Exhausted,
                        Err(e) => {
                            log::warn!("Query submission failed for {}: {e}", target.label());
                            SearchState::Retrying(RetryType::SubmissionFailed)
                        }
                    }
                }

                SearchState::AwaitingResults => {
                    // Direct pages have no search transition to settle
                    if adapter.mode() == PageMode::Search && !settings.settle_delay.is_zero() {
                        tokio::time::sleep(settings.settle_delay).await;
                    }
                    match wait_for_any(
                        session,
                        adapter.results_locators(),
                        settings.render_timeout,
                        settings.poll_interval,
                    )
                    .await
                    {
                        Ok(Some(_)) => SearchState::Matching,
                        Ok(None) => SearchState::Retrying(RetryType::ResultsTimeout),
                        Err(e) => {
                            log::warn!("Waiting for results failed: {e}");
                            SearchState::Retrying(RetryType::ResultsTimeout)
                        }
                    }
                }

                SearchState::Matching => match session.current_markup().await {
                    Ok(markup) => match self.select_candidate(adapter, target, &markup) {
                        Some(found) => {
                            confirmed = Some(found);
                            SearchState::Confirmed
                        }
                        None => SearchState::Retrying(RetryType::NoMatch),
                    },
                    Err(e) => {
                        log::warn!("Could not read results page: {e}");
                        SearchState::Retrying(RetryType::ParseFailed)
                    }
                },

                SearchState::Retrying(kind) => {
                    let (failures, budget) = if is_submission_failure(kind) {
                        submission_failures += 1;
                        (submission_failures, settings.submission_attempts)
                    } else {
                        match_failures += 1;
                        (match_failures, settings.match_attempts)
                    };

                    if failures >= budget {
                        log::warn!(
                            "{} on {}: {} ({}/{}), giving up",
                            target.label(),
                            adapter.platform(),
                            kind,
                            failures,
                            budget
                        );
                        SearchState::Exhausted
                    } else {
                        self.stats.increment_retry(kind);
                        log::warn!(
                            "{} on {}: {} ({}/{}), retrying",
                            target.label(),
                            adapter.platform(),
                            kind,
                            failures,
                            budget
                        );
                        if let Err(e) = adapter.recovery(session).await {
                            log::warn!("Recovery failed: {e}");
                        }
                        pause(settings).await;
                        if entered {
                            SearchState::Querying
                        } else {
                            SearchState::Idle
                        }
                    }
                }

                SearchState::Confirmed => {
                    return match confirmed {
                        Some((candidate, match_result)) => SearchOutcome::Confirmed {
                            candidate,
                            match_result,
                            attempts,
                        },
                        None => SearchOutcome::Exhausted { attempts },
                    };
                }

                SearchState::Exhausted => return SearchOutcome::Exhausted { attempts },
            };
        }
    }

    /// First candidate on the page that matches the target, in page order.
    fn select_candidate(
        &self,
        adapter: &dyn PlatformAdapter,
        target: &SearchTarget,
        markup: &str,
    ) -> Option<(Candidate, MatchResult)> {
        let candidates = {
            let document = Html::parse_document(markup);
            adapter.candidates(&document, target)
        };
        log::debug!(
            "{} candidate(s) for {} on {}",
            candidates.len(),
            target.label(),
            adapter.platform()
        );

        if adapter.confirms_by_address(target) {
            let result = MatchResult {
                title_match: true,
                artist_match: true,
                match_type: MatchType::ExactPartial,
            };
            return candidates.into_iter().next().map(|c| (c, result));
        }

        let engine = MatchEngine::new(self.settings);
        let wanted = NormalizedPair::new(&target.title, &target.artist);
        candidates.into_iter().find_map(|candidate| {
            let found = NormalizedPair::new(&candidate.title, &candidate.artist);
            let result = engine.compare_normalized(&found, &wanted);
            result.both_match().then_some((candidate, result))
        })
    }
}
