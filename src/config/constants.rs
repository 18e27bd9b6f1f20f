//! Configuration constants.
//!
//! Defaults for the crawl settings, sentinel values, and storage locations.
//! Nothing outside `config` should read these directly; they seed
//! [`CrawlSettings`](super::CrawlSettings), which is threaded through the pipeline.

use std::time::Duration;

/// Default SQLite database path.
pub const DB_PATH: &str = "./song_metrics.db";

/// Default directory that receives CSV exports (one sub-folder per destination).
pub const CSV_BASE_DIR: &str = "csv_folder";

/// Default W3C WebDriver endpoint (chromedriver's default port).
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Browser User-Agent sent through the WebDriver capabilities.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Render waits
/// Maximum time to wait for a results-bearing element to render.
pub const RENDER_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
/// Interval between element lookups while waiting for a render.
pub const RENDER_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Pause after submitting a query before results are inspected.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

// Backoff between attempts
/// Lower bound of the random pause between attempts and keystrokes.
pub const RANDOM_DELAY_MIN: Duration = Duration::from_millis(1200);
/// Upper bound of the random pause between attempts and keystrokes.
pub const RANDOM_DELAY_MAX: Duration = Duration::from_millis(2000);

// Attempt budgets
/// Attempts allowed when the search surface cannot be driven (input missing,
/// results never render). Kept low: a missing search box usually means the
/// layout changed.
pub const SUBMISSION_ATTEMPTS: u32 = 5;
/// Attempts allowed when results render but no candidate matches the target.
pub const MATCH_ATTEMPTS: u32 = 6;

// Matching thresholds
/// Minimum Jaccard similarity for the keyword stage.
pub const KEYWORD_SIMILARITY_THRESHOLD: f64 = 0.3;
/// Minimum length (chars) of a title before substring containment counts.
pub const MIN_TITLE_SUBSTRING_LEN: usize = 3;
/// Minimum length (chars) of an artist name before substring containment counts.
pub const MIN_ARTIST_SUBSTRING_LEN: usize = 2;
/// Minimum token length (chars) kept for keyword comparison.
pub const MIN_KEYWORD_LEN: usize = 2;

// Metric sentinels
/// Metric is not exposed by the platform.
pub const METRIC_NOT_OFFERED: i64 = -1;
/// Metric was expected but could not be extracted or parsed.
pub const METRIC_EXTRACTION_FAILED: i64 = -999;

// Session acquisition retry
/// Initial delay in milliseconds before retrying a WebDriver session request.
pub const SESSION_RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which the session retry delay grows.
pub const SESSION_RETRY_FACTOR: u64 = 2;
/// Maximum delay between session retries in seconds.
pub const SESSION_RETRY_MAX_DELAY_SECS: u64 = 5;
/// Session requests attempted before the batch is abandoned.
pub const SESSION_RETRY_MAX_ATTEMPTS: usize = 3;
/// HTTP timeout for a single WebDriver command.
pub const WEBDRIVER_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Characters stripped from export destination names.
pub const INVALID_FILENAME_CHARS: &str = r#"[\\/:*?"<>|]"#;
