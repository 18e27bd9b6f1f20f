//! Record validation and sentinel encoding.
//!
//! A record without a song identity is a structural error and is dropped.
//! A missing or unreadable metric is a data-quality problem and is kept,
//! encoded as [`METRIC_EXTRACTION_FAILED`]. Metrics the platform never
//! publishes are encoded as [`METRIC_NOT_OFFERED`].

use crate::config::{METRIC_EXTRACTION_FAILED, METRIC_NOT_OFFERED};
use crate::extract::decode_count;
use crate::models::{ExtractionRecord, RawMetric, RawRecord, Rejected};

/// Encodes one metric as a stored integer.
pub fn encode_metric(metric: &RawMetric) -> i64 {
    match metric {
        RawMetric::NotOffered => METRIC_NOT_OFFERED,
        RawMetric::Missing => METRIC_EXTRACTION_FAILED,
        RawMetric::Text(text) => decode_count(text).unwrap_or_else(|| {
            log::debug!("Undecodable metric text '{}'", text);
            METRIC_EXTRACTION_FAILED
        }),
        RawMetric::Value(value) if *value >= 0 => *value,
        RawMetric::Value(_) => METRIC_EXTRACTION_FAILED,
    }
}

/// Turns a raw record into a storable one.
///
/// # Errors
///
/// [`Rejected::MissingIdentity`] when the song identity is absent or blank.
pub fn validate(raw: RawRecord) -> Result<ExtractionRecord, Rejected> {
    let song_identity = raw
        .song_identity
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(Rejected::MissingIdentity)?
        .to_string();

    Ok(ExtractionRecord {
        song_identity,
        platform: raw.platform,
        views: encode_metric(&raw.views),
        listeners: encode_metric(&raw.listeners),
        extracted_date: raw.extracted_date,
        upload_date: raw.upload_date,
        source_url: raw.source_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use chrono::NaiveDate;

    fn raw(identity: Option<&str>, views: RawMetric, listeners: RawMetric) -> RawRecord {
        RawRecord {
            song_identity: identity.map(str::to_string),
            platform: Platform::Genie,
            views,
            listeners,
            extracted_date: NaiveDate::from_ymd_opt(2025, 1, 2).expect("valid date"),
            upload_date: None,
            source_url: None,
        }
    }

    #[test]
    fn test_encode_metric_sentinels() {
        assert_eq!(encode_metric(&RawMetric::NotOffered), -1);
        assert_eq!(encode_metric(&RawMetric::Missing), -999);
        assert_eq!(encode_metric(&RawMetric::Text("abc".into())), -999);
        assert_eq!(encode_metric(&RawMetric::Value(-3)), -999);
    }

    #[test]
    fn test_encode_metric_values() {
        assert_eq!(encode_metric(&RawMetric::Text("1.5만".into())), 15000);
        assert_eq!(encode_metric(&RawMetric::Value(0)), 0);
        assert_eq!(encode_metric(&RawMetric::Value(42)), 42);
    }

    #[test]
    fn test_validate_rejects_missing_identity() {
        let result = validate(raw(None, RawMetric::Value(1), RawMetric::Value(1)));
        assert_eq!(result, Err(Rejected::MissingIdentity));
        let result = validate(raw(Some("  "), RawMetric::Value(1), RawMetric::Value(1)));
        assert_eq!(result, Err(Rejected::MissingIdentity));
    }

    #[test]
    fn test_validate_keeps_record_with_failed_metric() {
        let record = validate(raw(
            Some(" 42 "),
            RawMetric::Missing,
            RawMetric::NotOffered,
        ))
        .expect("record should be kept");
        assert_eq!(record.song_identity, "42");
        assert_eq!(record.views, -999);
        assert_eq!(record.listeners, -1);
    }
}
