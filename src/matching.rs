//! Song identity matching.
//!
//! Decides whether a candidate (title, artist) scraped from a page is the
//! target song. Two stages:
//!
//! 1. **Exact / partial** on space-stripped forms: equality, or containment of
//!    one string in the other once it is long enough (titles >= 3 chars,
//!    artists >= 2). Absorbs suffix noise such as "(Feat. X)" or "- Remastered".
//! 2. **Keyword similarity** on space-preserving forms, only for the side(s)
//!    that failed stage 1: Jaccard similarity over tokens of >= 2 chars,
//!    accepted at >= 0.3.
//!
//! `both_match` is the only acceptance gate.

use std::collections::HashSet;

use crate::config::CrawlSettings;
use crate::normalize::{NormalizedPair, NormalizedText};

/// Which stage(s) produced the accepted side(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Every accepted side passed stage 1.
    ExactPartial,
    /// Every accepted side needed stage 2.
    KeywordSimilarity,
    /// One side from each stage.
    Mixed,
    /// Nothing matched.
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactPartial => "exact_partial",
            MatchType::KeywordSimilarity => "keyword_similarity",
            MatchType::Mixed => "mixed",
            MatchType::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub title_match: bool,
    pub artist_match: bool,
    pub match_type: MatchType,
}

impl MatchResult {
    pub fn both_match(&self) -> bool {
        self.title_match && self.artist_match
    }
}

/// How one side (title or artist) was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SideMatch {
    Stage1,
    Stage2,
    Failed,
}

impl SideMatch {
    fn matched(self) -> bool {
        self != SideMatch::Failed
    }
}

/// Match engine configured from [`CrawlSettings`].
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine<'a> {
    settings: &'a CrawlSettings,
}

impl<'a> MatchEngine<'a> {
    pub fn new(settings: &'a CrawlSettings) -> Self {
        Self { settings }
    }

    /// Compares a candidate against a target. Never fails; empty candidates
    /// never match.
    pub fn compare(
        &self,
        candidate_title: &str,
        candidate_artist: &str,
        target_title: &str,
        target_artist: &str,
    ) -> MatchResult {
        let candidate = NormalizedPair::new(candidate_title, candidate_artist);
        let target = NormalizedPair::new(target_title, target_artist);
        self.compare_normalized(&candidate, &target)
    }

    pub fn compare_normalized(
        &self,
        candidate: &NormalizedPair,
        target: &NormalizedPair,
    ) -> MatchResult {
        let title = self.decide_side(
            &candidate.title,
            &target.title,
            self.settings.min_title_substring_len,
        );
        let artist = self.decide_side(
            &candidate.artist,
            &target.artist,
            self.settings.min_artist_substring_len,
        );

        let match_type = match (title, artist) {
            (SideMatch::Failed, SideMatch::Failed) => MatchType::None,
            (SideMatch::Stage2, SideMatch::Stage1) | (SideMatch::Stage1, SideMatch::Stage2) => {
                MatchType::Mixed
            }
            (SideMatch::Stage2, _) | (_, SideMatch::Stage2) => MatchType::KeywordSimilarity,
            _ => MatchType::ExactPartial,
        };

        let result = MatchResult {
            title_match: title.matched(),
            artist_match: artist.matched(),
            match_type,
        };

        log::debug!(
            "Title '{}' vs '{}' = {:?}; artist '{}' vs '{}' = {:?}; both={} ({})",
            candidate.title.stripped,
            target.title.stripped,
            title,
            candidate.artist.stripped,
            target.artist.stripped,
            artist,
            result.both_match(),
            match_type.as_str()
        );

        result
    }

    fn decide_side(
        &self,
        candidate: &NormalizedText,
        target: &NormalizedText,
        min_substring_len: usize,
    ) -> SideMatch {
        if exact_or_partial(&candidate.stripped, &target.stripped, min_substring_len) {
            return SideMatch::Stage1;
        }
        let similarity = keyword_similarity(
            &candidate.spaced,
            &target.spaced,
            self.settings.min_keyword_len,
        );
        log::trace!(
            "Keyword similarity '{}' vs '{}' = {:.2}",
            candidate.spaced,
            target.spaced,
            similarity
        );
        if similarity >= self.settings.keyword_similarity_threshold {
            SideMatch::Stage2
        } else {
            SideMatch::Failed
        }
    }
}

/// Stage 1 on space-stripped forms.
///
/// Equal strings match, as does containment of either string in the other
/// when the contained string is at least `min_len` chars. An empty candidate
/// never matches.
pub fn exact_or_partial(candidate: &str, target: &str, min_len: usize) -> bool {
    if candidate.is_empty() {
        return false;
    }
    candidate == target
        || (candidate.chars().count() >= min_len && target.contains(candidate))
        || (target.chars().count() >= min_len && candidate.contains(target))
}

/// Whitespace tokens of at least `min_len` chars.
pub fn keywords(text: &str, min_len: usize) -> HashSet<&str> {
    text.split_whitespace()
        .filter(|word| word.chars().count() >= min_len)
        .collect()
}

/// Jaccard similarity of the keyword sets of two space-preserving strings.
/// 0.0 when either set is empty.
pub fn keyword_similarity(a: &str, b: &str, min_len: usize) -> f64 {
    let ka = keywords(a, min_len);
    let kb = keywords(b, min_len);
    if ka.is_empty() || kb.is_empty() {
        return 0.0;
    }
    let common = ka.intersection(&kb).count();
    let total = ka.union(&kb).count();
    common as f64 / total as f64
}
