//! CSV export functionality.
//!
//! One file per destination and platform:
//! `<base_dir>/<destination>/<platform>.csv`. Files are append-merged: rows
//! already on disk are read back, rows with the same
//! `(song_identity, platform, extracted_date)` key are replaced by the new
//! ones, and the table is rewritten newest extraction date first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::INVALID_FILENAME_CHARS;
use crate::error_handling::ExportError;
use crate::models::{ExtractionRecord, Platform};
use crate::storage::{init_db_pool_with_path, query_records, run_migrations, RecordFilter};

static INVALID_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(INVALID_FILENAME_CHARS).ok());

/// Makes a destination name safe to use as a directory name.
///
/// Filesystem-reserved characters are removed, whitespace runs become `_`,
/// and an empty result becomes `unknown`.
pub fn sanitize_destination(name: &str) -> String {
    let stripped = match INVALID_CHARS.as_ref() {
        Some(re) => re.replace_all(name, "").into_owned(),
        None => name.to_string(),
    };
    let joined = stripped.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "unknown".to_string()
    } else {
        joined
    }
}

/// Path of the export file for one destination and platform.
pub fn export_path(base_dir: &Path, destination: &str, platform: Platform) -> PathBuf {
    base_dir
        .join(sanitize_destination(destination))
        .join(format!("{}.csv", platform.as_str()))
}

fn read_existing(path: &Path) -> Result<Vec<ExtractionRecord>, ExportError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Appends `rows` to the platform's export file and returns its path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the existing file
/// cannot be read back or rewritten.
pub fn append_records(
    base_dir: &Path,
    destination: &str,
    platform: Platform,
    rows: &[ExtractionRecord],
) -> Result<PathBuf, ExportError> {
    let path = export_path(base_dir, destination, platform);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let existing = read_existing(&path)?;
    let previous = existing.len();

    let mut merged: Vec<ExtractionRecord> = Vec::with_capacity(existing.len() + rows.len());
    let mut index: HashMap<(String, Platform, NaiveDate), usize> = HashMap::new();
    for row in existing.into_iter().chain(rows.iter().cloned()) {
        let key = (row.song_identity.clone(), row.platform, row.extracted_date);
        match index.get(&key) {
            Some(&at) => merged[at] = row,
            None => {
                index.insert(key, merged.len());
                merged.push(row);
            }
        }
    }
    // Stable: rows sharing a date keep their file order
    merged.sort_by(|a, b| b.extracted_date.cmp(&a.extracted_date));

    let mut writer = csv::Writer::from_path(&path)?;
    for row in &merged {
        writer.serialize(row)?;
    }
    writer.flush()?;

    log::debug!(
        "Wrote {} row(s) to {} ({} previously on disk)",
        merged.len(),
        path.display(),
        previous
    );
    Ok(path)
}

/// Exports stored records for one platform into the destination's CSV file.
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database
/// * `base_dir` - Directory holding one folder per destination
/// * `destination` - Destination (company / service) name
/// * `platform` - Platform whose records are exported
/// * `since` - Only records extracted on or after this date
///
/// # Returns
///
/// Returns the number of records read from the store.
pub async fn export_csv(
    db_path: &Path,
    base_dir: &Path,
    destination: &str,
    platform: Platform,
    since: Option<NaiveDate>,
) -> Result<usize, ExportError> {
    let pool = init_db_pool_with_path(db_path).await?;
    run_migrations(&pool).await?;
    let filter = RecordFilter {
        platform: Some(platform),
        since,
        ..Default::default()
    };
    let rows = query_records(&pool, &filter).await?;
    pool.close().await;

    if rows.is_empty() {
        log::info!("No {} records to export", platform);
        return Ok(0);
    }
    let path = append_records(base_dir, destination, platform, &rows)?;
    log::info!("Exported {} {} record(s) to {}", rows.len(), platform, path.display());
    Ok(rows.len())
}
