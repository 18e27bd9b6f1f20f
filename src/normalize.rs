//! Text normalization for song titles and artist names.
//!
//! Source sites and user-supplied titles mix full-width glyphs, curly quotes,
//! and irregular spacing. Everything compared by the match engine goes through
//! [`normalize`] first.

use unicode_normalization::UnicodeNormalization;

/// Code points treated as an apostrophe: left/right single quote, backtick,
/// acute accent.
const APOSTROPHE_LIKE: [char; 4] = ['\u{2018}', '\u{2019}', '\u{0060}', '\u{00B4}'];

fn unify_apostrophes(text: &str) -> String {
    text.chars()
        .map(|c| if APOSTROPHE_LIKE.contains(&c) { '\'' } else { c })
        .collect()
}

/// Canonicalizes `text` for comparison.
///
/// Steps, in order: NFKC normalization, apostrophe unification, lowercasing,
/// whitespace collapsing, and (when `strip_spaces`) whitespace removal.
///
/// The acute accent has a compatibility decomposition (space + combining
/// accent), so apostrophe-like characters are also unified before NFKC.
/// Other spacing marks such as `¯` decompose the same way, and dropping the
/// space leaves a bare combining mark on the previous letter, so NFKC runs
/// once more at the end.
///
/// Deterministic and idempotent. Empty input yields an empty string.
pub fn normalize(text: &str, strip_spaces: bool) -> String {
    if text.is_empty() {
        return String::new();
    }

    let composed: String = unify_apostrophes(text).nfkc().collect();
    let lowered = unify_apostrophes(&composed).to_lowercase();

    let spaced: String = if strip_spaces {
        lowered.split_whitespace().collect()
    } else {
        lowered.split_whitespace().collect::<Vec<_>>().join(" ")
    };
    spaced.nfkc().collect()
}

/// Both normalized forms of one string.
///
/// `stripped` feeds exact / substring comparison, `spaced` feeds keyword
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub stripped: String,
    pub spaced: String,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        Self {
            stripped: normalize(text, true),
            spaced: normalize(text, false),
        }
    }
}

/// Normalized title and artist for a candidate or a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPair {
    pub title: NormalizedText,
    pub artist: NormalizedText,
}

impl NormalizedPair {
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            title: NormalizedText::new(title),
            artist: NormalizedText::new(artist),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize("", false), "");
        assert_eq!(normalize("", true), "");
    }

    #[test]
    fn test_normalize_apostrophes_unified() {
        assert_eq!(
            normalize("Wind\u{2019}s Caress", false),
            normalize("Wind's Caress", false)
        );
        assert_eq!(normalize("Don`t", true), "don't");
        assert_eq!(normalize("Don\u{00B4}t", true), "don't");
        assert_eq!(normalize("\u{2018}quoted\u{2019}", true), "'quoted'");
    }

    #[test]
    fn test_normalize_case_and_whitespace() {
        assert_eq!(normalize("  Super   Nova\t", false), "super nova");
        assert_eq!(normalize("  Super   Nova\t", true), "supernova");
    }

    #[test]
    fn test_normalize_full_width_glyphs() {
        // Full-width latin letters and ideographic space collapse under NFKC
        assert_eq!(normalize("ＡＢＣ\u{3000}ｄｅｆ", false), "abc def");
    }

    #[test]
    fn test_normalize_hangul_preserved() {
        assert_eq!(normalize("에스파 (aespa)", false), "에스파 (aespa)");
        assert_eq!(normalize("에스파 (aespa)", true), "에스파(aespa)");
    }

    #[test]
    fn test_normalized_text_forms() {
        let n = NormalizedText::new("Next  Level");
        assert_eq!(n.spaced, "next level");
        assert_eq!(n.stripped, "nextlevel");
    }

    #[test]
    fn test_normalize_spacing_marks_compose_after_strip() {
        // U+00AF decomposes to space + U+0304
        assert_eq!(normalize("O\u{00AF}", true), "\u{014D}");
        assert_eq!(normalize("O\u{00AF}", true), normalize("\u{014D}", true));
        assert_eq!(NormalizedText::new("O\u{00A8}").stripped, "\u{00F6}");
    }

    proptest! {
        #[test]
        fn test_normalize_idempotent(s in "\\PC{0,12}") {
            for strip in [false, true] {
                let once = normalize(&s, strip);
                prop_assert_eq!(normalize(&once, strip), once.clone());
            }
        }
    }
}
