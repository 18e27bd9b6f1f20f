//! YouTube Music (music.youtube.com).
//!
//! The play count is only exposed as the accessible label of a result row
//! column ("…회 재생"). Listener counts are not published.

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use super::{PageMode, PlatformAdapter, Submission};
use crate::browser::{wait_for_any, BrowserSession};
use crate::config::CrawlSettings;
use crate::crawl::pause;
use crate::error_handling::BrowserError;
use crate::extract::{extract, extract_where, find_all, ExtractKind, Locator};
use crate::models::{Candidate, Platform, RawMetric, RawMetrics, SearchTarget};

pub const YOUTUBE_MUSIC_BASE_URL: &str = "https://music.youtube.com/";

const SEARCH_BUTTONS: &[Locator] = &[
    Locator::Css(r#"button#button[aria-label="검색 시작"]"#),
    Locator::Css(r#"button[aria-label="검색"]"#),
    Locator::Css(r#"button[aria-label="Search"]"#),
];

const SEARCH_INPUTS: &[Locator] = &[
    Locator::Css("input#input"),
    Locator::Css(r#"input[aria-label="검색"]"#),
    Locator::Css(r#"input[aria-label="Search"]"#),
];

const SONGS_CHIP: &[Locator] = &[Locator::XPath(
    r#"//iron-selector[@id="chips"]//ytmusic-chip-cloud-chip-renderer//yt-formatted-string[text()="노래"]/ancestor::a"#,
)];

const RESULT_ROWS: &[Locator] = &[Locator::Css(
    "ytmusic-shelf-renderer ytmusic-responsive-list-item-renderer",
)];

const ROW_TITLE: &[Locator] = &[
    Locator::Css("yt-formatted-string.title a"),
    Locator::Css("yt-formatted-string.title"),
];

const ROW_ARTIST: &[Locator] = &[
    Locator::Css(".secondary-flex-columns a"),
    Locator::Css(".secondary-flex-columns yt-formatted-string"),
];

const ROW_PLAYS: &[Locator] = &[Locator::Css("yt-formatted-string.flex-column")];

/// Resolves a result link against the site root.
fn absolute_url(href: &str) -> Option<String> {
    let base = Url::parse(YOUTUBE_MUSIC_BASE_URL).ok()?;
    base.join(href).ok().map(String::from)
}

fn is_play_count(label: &str) -> bool {
    label.contains('회') && label.contains("재생")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YoutubeMusicAdapter;

#[async_trait]
impl PlatformAdapter for YoutubeMusicAdapter {
    fn platform(&self) -> Platform {
        Platform::YoutubeMusic
    }

    fn mode(&self) -> PageMode {
        PageMode::Search
    }

    fn entry_url(&self) -> Option<&'static str> {
        Some(YOUTUBE_MUSIC_BASE_URL)
    }

    async fn submit_query(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        settings: &CrawlSettings,
    ) -> Result<Submission, BrowserError> {
        // The input is hidden until the search button is pressed
        let mut input = None;
        for locator in SEARCH_INPUTS {
            input = session.find(locator).await?;
            if input.is_some() {
                break;
            }
        }
        if input.is_none() {
            if let Some(button) = wait_for_any(
                session,
                SEARCH_BUTTONS,
                settings.render_timeout,
                settings.poll_interval,
            )
            .await?
            {
                session.click(&button).await?;
            }
            input = wait_for_any(
                session,
                SEARCH_INPUTS,
                settings.render_timeout,
                settings.poll_interval,
            )
            .await?;
        }
        let Some(input) = input else {
            log::warn!("YouTube Music search input not found");
            return Ok(Submission::Failed);
        };

        session.type_into(&input, &self.query(target)).await?;
        pause(settings).await;
        session.submit(&input).await?;

        // Narrow results to songs; the unfiltered page still works without it
        pause(settings).await;
        match wait_for_any(session, SONGS_CHIP, settings.render_timeout, settings.poll_interval)
            .await
        {
            Ok(Some(chip)) => {
                if let Err(e) = session.click(&chip).await {
                    log::debug!("Songs filter click failed: {e}");
                }
            }
            Ok(None) => log::debug!("Songs filter not shown for {}", target.label()),
            Err(e) => log::debug!("Songs filter lookup failed: {e}"),
        }

        Ok(Submission::Submitted)
    }

    fn results_locators(&self) -> &'static [Locator] {
        RESULT_ROWS
    }

    fn candidates(&self, document: &Html, _target: &SearchTarget) -> Vec<Candidate> {
        find_all(document.root_element(), RESULT_ROWS)
            .into_iter()
            .filter_map(|row| {
                let title = extract(row, ROW_TITLE, ExtractKind::Text)?;
                let plays = extract_where(
                    row,
                    ROW_PLAYS,
                    ExtractKind::Attribute("aria-label"),
                    is_play_count,
                )
                .or_else(|| extract_where(row, ROW_PLAYS, ExtractKind::Text, is_play_count));
                let detail_ref = extract(row, ROW_TITLE, ExtractKind::Attribute("href"))
                    .and_then(|href| absolute_url(&href));
                Some(Candidate {
                    title,
                    artist: extract(row, ROW_ARTIST, ExtractKind::Text).unwrap_or_default(),
                    raw_metric_text: plays,
                    detail_ref,
                })
            })
            .collect()
    }

    async fn collect_metrics(
        &self,
        _session: &mut dyn BrowserSession,
        _target: &SearchTarget,
        candidate: &Candidate,
        _settings: &CrawlSettings,
    ) -> RawMetrics {
        RawMetrics {
            views: RawMetric::from_text(candidate.raw_metric_text.clone()),
            listeners: RawMetric::NotOffered,
            upload_date: None,
            source_url: candidate.detail_ref.clone(),
        }
    }

    async fn recovery(&self, session: &mut dyn BrowserSession) -> Result<(), BrowserError> {
        session.navigate(YOUTUBE_MUSIC_BASE_URL).await
    }
}
