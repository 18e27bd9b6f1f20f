//! Error type definitions.
//!
//! This module defines the error types for collaborator failures and the
//! counter categories tracked by [`ProcessingStats`](super::ProcessingStats).

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its typed form.
    #[error("Invalid stored value in column '{column}': {value}")]
    InvalidValue {
        /// Column holding the bad value
        column: &'static str,
        /// The raw value as stored
        value: String,
    },
}

/// Failures raised by the browser-automation collaborator.
///
/// Only [`BrowserError::SessionCreation`] is fatal for a batch; the search
/// controller treats every other variant as a transient extraction error.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// A browser session could not be created.
    #[error("Browser session could not be created: {0}")]
    SessionCreation(String),

    /// Transport-level failure talking to the WebDriver endpoint.
    #[error("WebDriver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The WebDriver endpoint answered with a protocol error.
    #[error("WebDriver error '{error}': {message}")]
    Protocol {
        /// W3C error code (e.g. `no such element`)
        error: String,
        /// Human-readable message from the driver
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected WebDriver response: {0}")]
    UnexpectedResponse(String),

    /// The session was used after release.
    #[error("Browser session already released")]
    Released,
}

/// Errors reading the target list.
#[derive(Error, Debug)]
pub enum TargetInputError {
    /// The file could not be opened.
    #[error("Failed to open target file: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be decoded.
    #[error("Invalid target row: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors writing CSV exports.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Filesystem failure.
    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding / decoding failure.
    #[error("Export CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Reading rows from the store failed.
    #[error("Export query error: {0}")]
    Database(#[from] DatabaseError),
}

/// Final outcome categories for a target or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum OutcomeType {
    /// Identity confirmed on the page
    Matched,
    /// Attempt budget exhausted without a confirmed match
    NotFound,
    /// Record dropped by the validator (structural error)
    Rejected,
    /// New row written
    PersistedCreated,
    /// Existing row for the same key and date overwritten
    PersistedUpdated,
    /// The store refused the write
    PersistFailed,
}

/// Reasons a search attempt was retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RetryType {
    /// The query could not be typed / submitted
    SubmissionFailed,
    /// Results never rendered within the wait timeout
    ResultsTimeout,
    /// Candidates were parsed but none matched
    NoMatch,
    /// Markup could not be read or parsed
    ParseFailed,
}

/// Metrics that fell back to a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum SentinelType {
    /// Encoded as "not offered by this platform"
    NotOffered,
    /// Encoded as "expected but extraction failed"
    ExtractionFailed,
}

impl std::fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OutcomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::Matched => "Matched",
            OutcomeType::NotFound => "Not found after retries",
            OutcomeType::Rejected => "Rejected (missing song identity)",
            OutcomeType::PersistedCreated => "Stored (new)",
            OutcomeType::PersistedUpdated => "Stored (overwrote same-day row)",
            OutcomeType::PersistFailed => "Store write failed",
        }
    }
}

impl std::fmt::Display for RetryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RetryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryType::SubmissionFailed => "Search submission failed",
            RetryType::ResultsTimeout => "Results did not render in time",
            RetryType::NoMatch => "No candidate matched",
            RetryType::ParseFailed => "Page markup could not be parsed",
        }
    }
}

impl std::fmt::Display for SentinelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SentinelType::NotOffered => "Metric not offered (-1)",
            SentinelType::ExtractionFailed => "Metric extraction failed (-999)",
        })
    }
}
