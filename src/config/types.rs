//! Configuration types.
//!
//! This module defines the immutable crawl settings threaded through the
//! pipeline, the library-level [`Config`], and the log option enums used by
//! the CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    CSV_BASE_DIR, DB_PATH, DEFAULT_USER_AGENT, DEFAULT_WEBDRIVER_URL,
    KEYWORD_SIMILARITY_THRESHOLD, MATCH_ATTEMPTS, MIN_ARTIST_SUBSTRING_LEN, MIN_KEYWORD_LEN,
    MIN_TITLE_SUBSTRING_LEN, RANDOM_DELAY_MAX, RANDOM_DELAY_MIN, RENDER_POLL_INTERVAL,
    RENDER_WAIT_TIMEOUT, SETTLE_DELAY, SUBMISSION_ATTEMPTS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Thresholds, attempt budgets, and wait times for one crawl.
///
/// Built once and passed by reference to the match engine, the search
/// controller, and the platform adapters. Tests construct it with zero delays
/// via [`CrawlSettings::immediate`].
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    /// Minimum Jaccard similarity accepted by the keyword stage.
    pub keyword_similarity_threshold: f64,
    /// Minimum title length before substring containment is accepted.
    pub min_title_substring_len: usize,
    /// Minimum artist length before substring containment is accepted.
    pub min_artist_substring_len: usize,
    /// Minimum token length kept for keyword comparison.
    pub min_keyword_len: usize,
    /// Attempts allowed for failed query submissions / render timeouts.
    pub submission_attempts: u32,
    /// Attempts allowed for rendered pages with no matching candidate.
    pub match_attempts: u32,
    /// Per-wait timeout for results to render.
    pub render_timeout: Duration,
    /// Poll interval while waiting for a render.
    pub poll_interval: Duration,
    /// Pause after submitting a query.
    pub settle_delay: Duration,
    /// Lower bound of the random backoff.
    pub backoff_min: Duration,
    /// Upper bound of the random backoff.
    pub backoff_max: Duration,
}

impl CrawlSettings {
    /// Settings with every wait set to zero. Budgets and thresholds keep their
    /// defaults.
    pub fn immediate() -> Self {
        Self {
            render_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
            settle_delay: Duration::ZERO,
            backoff_min: Duration::ZERO,
            backoff_max: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            keyword_similarity_threshold: KEYWORD_SIMILARITY_THRESHOLD,
            min_title_substring_len: MIN_TITLE_SUBSTRING_LEN,
            min_artist_substring_len: MIN_ARTIST_SUBSTRING_LEN,
            min_keyword_len: MIN_KEYWORD_LEN,
            submission_attempts: SUBMISSION_ATTEMPTS,
            match_attempts: MATCH_ATTEMPTS,
            render_timeout: RENDER_WAIT_TIMEOUT,
            poll_interval: RENDER_POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
            backoff_min: RANDOM_DELAY_MIN,
            backoff_max: RANDOM_DELAY_MAX,
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use song_metrics::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("./metrics.db"),
///     sessions: 2,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// WebDriver endpoint used to acquire browser sessions
    pub webdriver_url: String,

    /// Browser User-Agent
    pub user_agent: String,

    /// Run the browser without a window
    pub headless: bool,

    /// Independent browser sessions per platform
    pub sessions: usize,

    /// Export destination (company / service folder); `None` disables CSV export
    pub export_destination: Option<String>,

    /// Base directory for CSV exports
    pub export_dir: PathBuf,

    /// Thresholds, budgets, and waits
    pub settings: CrawlSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headless: true,
            sessions: 1,
            export_destination: None,
            export_dir: PathBuf::from(CSV_BASE_DIR),
            settings: CrawlSettings::default(),
        }
    }
}
