//! YouTube video pages.
//!
//! No search: the caller supplies the video URL and the page is opened
//! directly. The video title is still checked against the target title.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;

use super::{PageMode, PlatformAdapter, Submission};
use crate::browser::BrowserSession;
use crate::config::CrawlSettings;
use crate::error_handling::BrowserError;
use crate::extract::{decode_date, extract, extract_from, ExtractKind, Locator};
use crate::models::{Candidate, Platform, RawMetric, RawMetrics, SearchTarget};

static VIDEO_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:v=|youtu\.be/|shorts/)([A-Za-z0-9_-]{11})")
        .unwrap_or_else(|e| panic!("Invalid video id pattern: {e}. This is a programming error."))
});

const TITLE_SELECTORS: &[Locator] = &[
    Locator::Css("h1.style-scope.ytd-watch-metadata"),
    Locator::Css("h1.style-scope.ytd-watch-metadata > yt-formatted-string"),
    Locator::Css("yt-formatted-string.style-scope.ytd-watch-metadata"),
    Locator::Css("h1.title"),
    Locator::Css("h1.ytd-watch-metadata"),
    Locator::Css("h1#title"),
];

const TITLE_META: &[Locator] = &[
    Locator::Css(r#"meta[name="title"]"#),
    Locator::Css(r#"meta[property="og:title"]"#),
];

const CHANNEL_SELECTORS: &[Locator] = &[
    Locator::Css("ytd-channel-name#channel-name a"),
    Locator::Css("#owner #channel-name a"),
    Locator::Css("#upload-info #channel-name a"),
    Locator::Css("ytd-video-owner-renderer #channel-name"),
];

const CHANNEL_META: &[Locator] = &[Locator::Css(r#"span[itemprop="author"] link[itemprop="name"]"#)];

const VIEW_COUNT_SELECTORS: &[Locator] = &[
    Locator::Css("yt-formatted-string#info span:first-child"),
    Locator::Css("yt-formatted-string#info > span:first-child"),
    Locator::Css("yt-formatted-string#info > span"),
    Locator::Css("span.view-count"),
    Locator::Css("span#view-count"),
    Locator::Css("div#count span.view-count"),
    Locator::Css("div#info span.view-count"),
    Locator::Css("span.ytd-video-view-count-renderer"),
    Locator::Css("yt-view-count-renderer span.view-count"),
];

const VIEW_COUNT_META: &[Locator] = &[Locator::Css(r#"meta[itemprop="interactionCount"]"#)];

const UPLOAD_DATE_SELECTORS: &[Locator] = &[
    Locator::Css("div#info-strings yt-formatted-string"),
    Locator::Css("div#date yt-formatted-string"),
    Locator::Css("span.date"),
    Locator::Css("div#info-strings"),
    Locator::Css("yt-formatted-string#info-strings"),
];

const UPLOAD_DATE_META: &[Locator] = &[
    Locator::Css(r#"meta[itemprop="uploadDate"]"#),
    Locator::Css(r#"meta[itemprop="datePublished"]"#),
];

/// The 11-character video id in a watch, short-link, or shorts URL.
pub fn video_id(url: &str) -> Option<&str> {
    VIDEO_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn page_view_text(document: &Html) -> Option<String> {
    extract_from(document, VIEW_COUNT_SELECTORS, ExtractKind::Text)
        .or_else(|| extract_from(document, VIEW_COUNT_META, ExtractKind::Attribute("content")))
}

fn page_upload_date(document: &Html) -> Option<chrono::NaiveDate> {
    extract_from(document, UPLOAD_DATE_SELECTORS, ExtractKind::Text)
        .as_deref()
        .and_then(decode_date)
        .or_else(|| {
            extract_from(document, UPLOAD_DATE_META, ExtractKind::Attribute("content"))
                .as_deref()
                .and_then(decode_date)
        })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YoutubeAdapter;

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn mode(&self) -> PageMode {
        PageMode::Direct
    }

    fn entry_url(&self) -> Option<&'static str> {
        None
    }

    async fn submit_query(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        _settings: &CrawlSettings,
    ) -> Result<Submission, BrowserError> {
        let Some(url) = target.url.as_deref().filter(|url| video_id(url).is_some()) else {
            log::warn!(
                "No valid YouTube URL for {} ({:?})",
                target.label(),
                target.url
            );
            return Ok(Submission::Unsupported);
        };
        session.navigate(url).await?;
        Ok(Submission::Submitted)
    }

    fn results_locators(&self) -> &'static [Locator] {
        TITLE_SELECTORS
    }

    fn candidates(&self, document: &Html, target: &SearchTarget) -> Vec<Candidate> {
        let root = document.root_element();
        let Some(title) = extract(root, TITLE_SELECTORS, ExtractKind::Text)
            .or_else(|| extract(root, TITLE_META, ExtractKind::Attribute("content")))
        else {
            return Vec::new();
        };
        let artist = extract(root, CHANNEL_SELECTORS, ExtractKind::Text)
            .or_else(|| extract(root, CHANNEL_META, ExtractKind::Attribute("content")))
            .unwrap_or_else(|| target.artist.clone());

        vec![Candidate {
            title,
            artist,
            raw_metric_text: page_view_text(document),
            detail_ref: target.url.clone(),
        }]
    }

    fn confirms_by_address(&self, target: &SearchTarget) -> bool {
        target.title.trim().is_empty() && target.url.as_deref().and_then(video_id).is_some()
    }

    async fn collect_metrics(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        candidate: &Candidate,
        _settings: &CrawlSettings,
    ) -> RawMetrics {
        let markup = match session.current_markup().await {
            Ok(markup) => Some(markup),
            Err(e) => {
                log::warn!("Could not read video page for {}: {e}", target.label());
                None
            }
        };
        let (view_text, upload_date) = match markup {
            Some(markup) => {
                let document = Html::parse_document(&markup);
                (
                    candidate
                        .raw_metric_text
                        .clone()
                        .or_else(|| page_view_text(&document)),
                    page_upload_date(&document),
                )
            }
            None => (candidate.raw_metric_text.clone(), None),
        };

        RawMetrics {
            views: RawMetric::from_text(view_text),
            listeners: RawMetric::NotOffered,
            upload_date,
            source_url: target.url.clone(),
        }
    }
}
