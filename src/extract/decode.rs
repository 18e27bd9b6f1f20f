//! Decoders for locale-formatted counts and dates.
//!
//! Both return `None` on anything they cannot decode; the caller turns that
//! into the extraction-failed sentinel.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Tokens removed before a count is parsed.
const COUNT_NOISE: [&str; 6] = ["조회수", "재생", "회", "views", "view", ","];

/// Korean magnitude suffixes and their multipliers.
const MAGNITUDES: [(char, f64); 3] = [('억', 100_000_000.0), ('만', 10_000.0), ('천', 1_000.0)];

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})[.\-/\s년]*(\d{1,2})[.\-/\s월]*(\d{1,2})")
        .unwrap_or_else(|e| panic!("Invalid date pattern: {e}. This is a programming error."))
});

/// Decodes a display count such as `"1.5만"`, `"3천"`, `"1,234,567"`, or
/// `"조회수 2,001회"`.
///
/// Negative or non-numeric input yields `None`.
pub fn decode_count(text: &str) -> Option<i64> {
    let mut cleaned = text.to_lowercase();
    for noise in COUNT_NOISE {
        cleaned = cleaned.replace(noise, "");
    }
    let cleaned: String = cleaned.split_whitespace().collect();
    if cleaned.is_empty() {
        return None;
    }

    for (suffix, multiplier) in MAGNITUDES {
        if cleaned.contains(suffix) {
            let number: f64 = cleaned.replace(suffix, "").parse().ok()?;
            if !number.is_finite() || number < 0.0 {
                return None;
            }
            let value = (number * multiplier).round();
            // `as` saturates, so out-of-range values must be caught first
            if value >= i64::MAX as f64 {
                return None;
            }
            return Some(value as i64);
        }
    }

    cleaned.parse::<i64>().ok().filter(|n| *n >= 0)
}

/// Finds the first valid `YYYY<sep>M<sep>D` date in `text`.
///
/// Separators may be `.`, `-`, `/`, whitespace, or Korean year / month
/// markers, in any repetition. Hits that are not calendar dates are skipped.
pub fn decode_date(text: &str) -> Option<NaiveDate> {
    DATE_PATTERN.captures_iter(text).find_map(|caps| {
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}
