//! Genie (genie.co.kr).
//!
//! Search results are table rows; the listener and play totals live on each
//! song's detail page under `.daily-chart .total`.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{PageMode, PlatformAdapter, Submission};
use crate::browser::{wait_for_any, BrowserSession};
use crate::config::CrawlSettings;
use crate::crawl::pause;
use crate::error_handling::BrowserError;
use crate::extract::{extract, find_all, ExtractKind, Locator};
use crate::models::{Candidate, Platform, RawMetric, RawMetrics, SearchTarget};

pub const GENIE_BASE_URL: &str = "https://www.genie.co.kr/";
const DETAIL_URL_PREFIX: &str = "https://www.genie.co.kr/detail/songInfo?xgnm=";

const SEARCH_INPUTS: &[Locator] = &[
    Locator::Css("input[type='search']"),
    Locator::Css("input.searchField"),
    Locator::Css("#keyword"),
];

const RESULT_ROWS: &[Locator] = &[Locator::Css("tr.list__item"), Locator::Css("tr.list")];

const RESULTS_READY: &[Locator] = &[
    Locator::Css("tr.list__item"),
    Locator::Css("tr.list"),
    Locator::Css("h2.name"),
];

const ROW_TITLE: &[Locator] = &[
    Locator::Css("td.info a.title"),
    Locator::Css("a.title"),
    Locator::Css("td.info a"),
];

const ROW_ARTIST: &[Locator] = &[
    Locator::Css("td.info a.artist"),
    Locator::Css("a.artist"),
    Locator::Css("td.info a.link__text"),
    Locator::Css("a.link__text"),
];

const SONG_INFO_BUTTON: &[Locator] = &[
    Locator::Css(r#"a.btn-basic.btn-info[onclick^="fnViewSongInfo"]"#),
    Locator::Css(r#"a[onclick^="fnViewSongInfo"]"#),
];

const DETAIL_TITLE: &[Locator] = &[Locator::Css("h2.name")];

const DETAIL_ARTIST: &[Locator] = &[
    Locator::Css(r#"a[onclick^="fnGoMore('artistInfo'"]"#),
    Locator::Css("div.info-zone p.artist a"),
    Locator::Css("div.info-zone p.artist"),
    Locator::Css("p.artist a"),
    Locator::Css("p.artist"),
    Locator::Css("a.link__text"),
];

const STATS_READY: &[Locator] = &[Locator::Css(".daily-chart .total")];

static SONG_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"fnViewSongInfo\(\s*'?(\d+)")
        .unwrap_or_else(|e| panic!("Invalid song id pattern: {e}. This is a programming error."))
});

static STATS_TOTAL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".daily-chart .total")
        .unwrap_or_else(|e| panic!("Invalid stats selector: {e}. This is a programming error."))
});

static STATS_PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div p")
        .unwrap_or_else(|e| panic!("Invalid stats selector: {e}. This is a programming error."))
});

/// Genie song id of a result row, from its `songid` attribute or the
/// song-info button's click handler.
fn row_song_id(row: ElementRef<'_>) -> Option<String> {
    if let Some(id) = row.value().attr("songid").map(str::trim) {
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    let handler = extract(row, SONG_INFO_BUTTON, ExtractKind::Attribute("onclick"))?;
    SONG_ID_PATTERN
        .captures(&handler)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn detail_url(song_id: &str) -> String {
    format!("{}{}", DETAIL_URL_PREFIX, song_id)
}

/// Listener and play totals from a detail page: the first paragraph is the
/// listener count, the second the play count.
fn parse_stats(markup: &str) -> (RawMetric, RawMetric) {
    let document = Html::parse_document(markup);
    let Some(total) = document.select(&STATS_TOTAL).next() else {
        return (RawMetric::Missing, RawMetric::Missing);
    };
    let mut values = total
        .select(&STATS_PARAGRAPHS)
        .map(|p| p.text().collect::<String>().trim().to_string());
    let listeners = RawMetric::from_text(values.next().filter(|v| !v.is_empty()));
    let plays = RawMetric::from_text(values.next().filter(|v| !v.is_empty()));
    (listeners, plays)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenieAdapter;

#[async_trait]
impl PlatformAdapter for GenieAdapter {
    fn platform(&self) -> Platform {
        Platform::Genie
    }

    fn mode(&self) -> PageMode {
        PageMode::Search
    }

    fn entry_url(&self) -> Option<&'static str> {
        Some(GENIE_BASE_URL)
    }

    async fn submit_query(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        settings: &CrawlSettings,
    ) -> Result<Submission, BrowserError> {
        let input = wait_for_any(
            session,
            SEARCH_INPUTS,
            settings.render_timeout,
            settings.poll_interval,
        )
        .await?;
        let Some(input) = input else {
            log::warn!("Genie search box not found");
            return Ok(Submission::Failed);
        };

        session.type_into(&input, &self.query(target)).await?;
        pause(settings).await;
        session.submit(&input).await?;
        Ok(Submission::Submitted)
    }

    fn results_locators(&self) -> &'static [Locator] {
        RESULTS_READY
    }

    fn candidates(&self, document: &Html, _target: &SearchTarget) -> Vec<Candidate> {
        let root = document.root_element();
        let rows = find_all(root, RESULT_ROWS);

        if rows.is_empty() {
            // Some queries land straight on the song detail page
            return extract(root, DETAIL_TITLE, ExtractKind::Text)
                .map(|title| Candidate {
                    title,
                    artist: extract(root, DETAIL_ARTIST, ExtractKind::Text).unwrap_or_default(),
                    raw_metric_text: None,
                    detail_ref: None,
                })
                .into_iter()
                .collect();
        }

        rows.into_iter()
            .filter_map(|row| {
                let title = extract(row, ROW_TITLE, ExtractKind::Text)?;
                Some(Candidate {
                    title,
                    artist: extract(row, ROW_ARTIST, ExtractKind::Text).unwrap_or_default(),
                    raw_metric_text: None,
                    detail_ref: row_song_id(row),
                })
            })
            .collect()
    }

    async fn collect_metrics(
        &self,
        session: &mut dyn BrowserSession,
        target: &SearchTarget,
        candidate: &Candidate,
        settings: &CrawlSettings,
    ) -> RawMetrics {
        let source_url = match &candidate.detail_ref {
            Some(song_id) => {
                let url = detail_url(song_id);
                if let Err(e) = session.navigate(&url).await {
                    log::warn!("Could not open Genie detail page for {}: {e}", target.label());
                    return RawMetrics {
                        source_url: Some(url),
                        ..Default::default()
                    };
                }
                Some(url)
            }
            None => session.current_url().await.ok(),
        };

        match wait_for_any(
            session,
            STATS_READY,
            settings.render_timeout,
            settings.poll_interval,
        )
        .await
        {
            Ok(Some(_)) => {}
            Ok(None) => log::warn!("Genie stats block did not render for {}", target.label()),
            Err(e) => log::warn!("Genie stats lookup failed for {}: {e}", target.label()),
        }

        let markup = match session.current_markup().await {
            Ok(markup) => markup,
            Err(e) => {
                log::warn!("Could not read Genie detail page for {}: {e}", target.label());
                return RawMetrics {
                    source_url,
                    ..Default::default()
                };
            }
        };

        let (listeners, views) = parse_stats(&markup);
        RawMetrics {
            views,
            listeners,
            upload_date: None,
            source_url,
        }
    }
}
