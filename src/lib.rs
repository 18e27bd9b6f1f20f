//! song_metrics library: song identification and metric extraction
//!
//! This library finds a known song (artist + title) on streaming catalog pages
//! that change layout without notice, confirms the candidate is the right
//! song, and records its play / listener / view counts in a SQLite database,
//! one row per song, platform, and day.
//!
//! # Example
//!
//! ```no_run
//! use song_metrics::{run_crawl, Config, Platform, SearchTarget};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     sessions: 2,
//!     ..Default::default()
//! };
//! let targets = vec![SearchTarget::new("1042", Platform::Genie, "aespa", "Supernova")];
//! let today = chrono::Local::now().date_naive();
//!
//! let report = run_crawl(&config, targets, today).await?;
//! println!("{} stored, {} not found", report.persisted, report.not_found);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime and, for real crawls, a W3C
//! WebDriver endpoint (e.g. chromedriver) at `Config::webdriver_url`.

pub mod browser;
pub mod config;
pub mod crawl;
pub mod error_handling;
pub mod export;
pub mod extract;
pub mod initialization;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod platform;
pub mod storage;
pub mod targets;
pub mod validate;

// Re-export public API
pub use config::{Config, CrawlSettings, LogFormat, LogLevel};
pub use crawl::{run_crawl, run_crawl_with, CrawlReport};
pub use models::{ExtractionRecord, Platform, SearchTarget, TargetOutcome, UpsertOutcome};
pub use storage::{query_records, run_migrations, RecordFilter};
pub use targets::load_targets;
