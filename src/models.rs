//! Typed records passed between pipeline stages.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Streaming platform a record was extracted from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Genie,
    Youtube,
    YoutubeMusic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Genie => "genie",
            Platform::Youtube => "youtube",
            Platform::YoutubeMusic => "youtube_music",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "genie" => Ok(Platform::Genie),
            "youtube" => Ok(Platform::Youtube),
            "youtube_music" | "ytmusic" => Ok(Platform::YoutubeMusic),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

/// One song to look up on one platform. Supplied by the caller, never mutated.
///
/// `song_identity` is the caller's stable key (the song catalog id). It is kept
/// as an `Option` so that a missing key reaches the validator and is rejected
/// there instead of being guessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub song_identity: Option<String>,
    pub platform: Platform,
    pub artist: String,
    pub title: String,
    /// Page to open directly (YouTube video URL); unused by search platforms.
    pub url: Option<String>,
}

impl SearchTarget {
    pub fn new(
        song_identity: impl Into<String>,
        platform: Platform,
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            song_identity: Some(song_identity.into()),
            platform,
            artist: artist.into(),
            title: title.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// `artist - title`, for log lines.
    pub fn label(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// One search-result entry under evaluation. Scoped to a single match attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub title: String,
    pub artist: String,
    pub raw_metric_text: Option<String>,
    /// Platform-specific pointer to the candidate's detail page (URL or id).
    pub detail_ref: Option<String>,
}

/// A metric as observed on the page, before sentinel encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMetric {
    /// The platform does not expose this metric.
    NotOffered,
    /// Expected but nothing was found.
    Missing,
    /// Locale-formatted text still to be decoded ("1.5만 회").
    Text(String),
    /// Already-decoded value.
    Value(i64),
}

impl RawMetric {
    /// `Text` when `text` is present, `Missing` otherwise.
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(t) => RawMetric::Text(t),
            None => RawMetric::Missing,
        }
    }
}

/// Metrics collected for a confirmed candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetrics {
    pub views: RawMetric,
    pub listeners: RawMetric,
    pub upload_date: Option<NaiveDate>,
    pub source_url: Option<String>,
}

impl Default for RawMetrics {
    fn default() -> Self {
        Self {
            views: RawMetric::Missing,
            listeners: RawMetric::Missing,
            upload_date: None,
            source_url: None,
        }
    }
}

/// Unvalidated record handed to the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub song_identity: Option<String>,
    pub platform: Platform,
    pub views: RawMetric,
    pub listeners: RawMetric,
    pub extracted_date: NaiveDate,
    pub upload_date: Option<NaiveDate>,
    pub source_url: Option<String>,
}

impl RawRecord {
    pub fn from_metrics(target: &SearchTarget, metrics: RawMetrics, extracted_date: NaiveDate) -> Self {
        Self {
            song_identity: target.song_identity.clone(),
            platform: target.platform,
            views: metrics.views,
            listeners: metrics.listeners,
            extracted_date,
            upload_date: metrics.upload_date,
            source_url: metrics.source_url,
        }
    }
}

/// The persisted unit. `views` / `listeners` hold a real count (>= 0),
/// `-1` (not offered), or `-999` (extraction failed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub song_identity: String,
    pub platform: Platform,
    pub views: i64,
    pub listeners: i64,
    pub extracted_date: NaiveDate,
    pub upload_date: Option<NaiveDate>,
    pub source_url: Option<String>,
}

/// Result of a keyed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Why the validator dropped a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    MissingIdentity,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejected::MissingIdentity => f.write_str("song identity is missing"),
        }
    }
}

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Identity confirmed and the record stored.
    Persisted {
        record: ExtractionRecord,
        outcome: UpsertOutcome,
    },
    /// Attempt budget exhausted without a confirmed match.
    NotFound { attempts: u32 },
    /// Confirmed on the page but dropped by the validator.
    Rejected(Rejected),
    /// Confirmed and valid, but the store refused the write.
    StoreFailed { message: String },
}
