//! Target list input.
//!
//! A target file is a CSV with the header
//! `song_identity,platform,artist,title,url`. The `url` column is only needed
//! for YouTube and may be left empty or omitted.

use std::path::Path;

use serde::Deserialize;

use crate::error_handling::TargetInputError;
use crate::models::{Platform, SearchTarget};

#[derive(Debug, Deserialize)]
struct TargetRow {
    #[serde(default)]
    song_identity: String,
    platform: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
}

impl TargetRow {
    fn into_target(self) -> Result<SearchTarget, String> {
        let platform: Platform = self.platform.parse()?;
        let identity = self.song_identity.trim();
        Ok(SearchTarget {
            // Kept even when blank: the validator rejects it after the search
            song_identity: (!identity.is_empty()).then(|| identity.to_string()),
            platform,
            artist: self.artist.trim().to_string(),
            title: self.title.trim().to_string(),
            url: self
                .url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        })
    }
}

/// Reads search targets from a CSV file.
///
/// Rows naming an unknown platform are skipped with a warning. Rows with an
/// empty identity are kept as-is.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row is not valid CSV.
pub fn load_targets(path: &Path) -> Result<Vec<SearchTarget>, TargetInputError> {
    let file = std::fs::File::open(path)?;
    read_targets(file)
}

/// [`load_targets`] over any reader.
pub fn read_targets<R: std::io::Read>(reader: R) -> Result<Vec<SearchTarget>, TargetInputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let mut targets = Vec::new();
    for (index, row) in csv_reader.deserialize::<TargetRow>().enumerate() {
        let row = row?;
        match row.into_target() {
            Ok(target) => targets.push(target),
            Err(e) => log::warn!("Skipping target row {}: {}", index + 1, e),
        }
    }
    log::info!("Loaded {} target(s)", targets.len());
    Ok(targets)
}
