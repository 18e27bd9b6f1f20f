//! Export functionality for song_metrics data.
//!
//! Stored records are exported into per-destination, per-platform CSV files
//! that accumulate across runs.

mod csv;

pub use self::csv::{append_records, export_csv, export_path, sanitize_destination};
