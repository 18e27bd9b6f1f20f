//! Per-platform page knowledge.
//!
//! Each adapter knows how to drive one site's search surface, how to turn a
//! rendered results page into [`Candidate`]s, and where the metrics of a
//! confirmed candidate live. The retry policy itself lives in the search
//! controller; adapters only perform single steps.

mod genie;
mod youtube;
mod youtube_music;

use async_trait::async_trait;
use scraper::Html;

use crate::browser::BrowserSession;
use crate::config::CrawlSettings;
use crate::error_handling::BrowserError;
use crate::extract::Locator;
use crate::models::{Candidate, Platform, RawMetrics, SearchTarget};

pub use genie::{detail_url as genie_detail_url, GenieAdapter};
pub use youtube::{video_id, YoutubeAdapter};
pub use youtube_music::YoutubeMusicAdapter;

/// How a platform's target page is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Type a query into the site's search box.
    Search,
    /// Open the caller-supplied URL directly.
    Direct,
}

/// Result of one attempt to put a query on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The query (or direct URL) was submitted.
    Submitted,
    /// The search surface could not be driven this time.
    Failed,
    /// The target cannot be looked up on this platform at all.
    Unsupported,
}

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn mode(&self) -> PageMode;

    /// Page opened once before the first query, if any.
    fn entry_url(&self) -> Option<&'static str>;

    /// Search text for a target.
    fn query(&self, target: &SearchTarget) -> String {
        format!("{} {}", target.artist, target.title)
            .trim()
            .to_string()
    }

    async fn submit_query(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        settings: &CrawlSettings,
    ) -> Result<Submission, BrowserError>;

    /// Elements whose presence means results (or the detail page) rendered.
    fn results_locators(&self) -> &'static [Locator];

    /// Candidates on a rendered page, in page order.
    fn candidates(&self, document: &Html, target: &SearchTarget) -> Vec<Candidate>;

    /// Whether the page address alone identifies the target. Only true for
    /// direct pages when there is no title to compare against.
    fn confirms_by_address(&self, _target: &SearchTarget) -> bool {
        false
    }

    /// Reads the metrics of a confirmed candidate. Never fails: anything that
    /// cannot be read is reported as [`RawMetric::Missing`](crate::models::RawMetric::Missing).
    async fn collect_metrics(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        candidate: &Candidate,
        settings: &CrawlSettings,
    ) -> RawMetrics;

    /// Brings the page back to a searchable state after a failed attempt.
    async fn recovery(&self, session: &mut dyn BrowserSession) -> Result<(), BrowserError> {
        session.refresh().await
    }
}

/// The adapter for `platform`.
pub fn adapter_for(platform: Platform) -> Box<dyn PlatformAdapter> {
    match platform {
        Platform::Genie => Box::new(GenieAdapter),
        Platform::Youtube => Box::new(YoutubeAdapter),
        Platform::YoutubeMusic => Box::new(YoutubeMusicAdapter),
    }
}
