//! Song catalog and crawling periods.
//!
//! The catalog stores, per song, the artist and title each platform displays
//! plus the YouTube video URL. A crawling period marks the dates on which a
//! song should be crawled.

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{Platform, SearchTarget};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SongInfo {
    pub id: String,
    pub genie_artist: Option<String>,
    pub genie_title: Option<String>,
    pub youtube_music_artist: Option<String>,
    pub youtube_music_title: Option<String>,
    pub youtube_url: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SongInfo {
    /// The search target for `platform`, or `None` when the catalog has no
    /// data for it. YouTube reuses the YouTube Music artist and title.
    pub fn target_for(&self, platform: Platform) -> Option<SearchTarget> {
        match platform {
            Platform::Genie => Some(SearchTarget::new(
                self.id.clone(),
                platform,
                present(&self.genie_artist)?,
                present(&self.genie_title)?,
            )),
            Platform::YoutubeMusic => Some(SearchTarget::new(
                self.id.clone(),
                platform,
                present(&self.youtube_music_artist)?,
                present(&self.youtube_music_title)?,
            )),
            Platform::Youtube => {
                let url = present(&self.youtube_url)?;
                Some(
                    SearchTarget::new(
                        self.id.clone(),
                        platform,
                        present(&self.youtube_music_artist).unwrap_or_default(),
                        present(&self.youtube_music_title).unwrap_or_default(),
                    )
                    .with_url(url),
                )
            }
        }
    }
}

/// Inserts or replaces a catalog entry.
pub async fn insert_song_info(pool: &SqlitePool, song: &SongInfo) -> Result<(), DatabaseError> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    sqlx::query(
        "INSERT INTO song_info (
            id, genie_artist, genie_title, youtube_music_artist, youtube_music_title,
            youtube_url, created_at_ms, updated_at_ms
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            genie_artist = excluded.genie_artist,
            genie_title = excluded.genie_title,
            youtube_music_artist = excluded.youtube_music_artist,
            youtube_music_title = excluded.youtube_music_title,
            youtube_url = excluded.youtube_url,
            updated_at_ms = excluded.updated_at_ms",
    )
    .bind(&song.id)
    .bind(&song.genie_artist)
    .bind(&song.genie_title)
    .bind(&song.youtube_music_artist)
    .bind(&song.youtube_music_title)
    .bind(&song.youtube_url)
    .bind(now_ms)
    .bind(now_ms)
    .execute(pool)
    .await?;
    Ok(())
}

/// Adds a crawling period and returns its id.
pub async fn insert_crawling_period(
    pool: &SqlitePool,
    song_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_active: bool,
) -> Result<i64, DatabaseError> {
    let id = sqlx::query_scalar(
        "INSERT INTO crawling_period (song_id, start_date, end_date, is_active, created_at_ms)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(song_id)
    .bind(start_date.format(DATE_FORMAT).to_string())
    .bind(end_date.format(DATE_FORMAT).to_string())
    .bind(is_active)
    .bind(chrono::Utc::now().timestamp_millis())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Songs with an active crawling period covering `date`.
pub async fn query_active_songs(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<SongInfo>, DatabaseError> {
    let day = date.format(DATE_FORMAT).to_string();
    let rows = sqlx::query(
        "SELECT s.id, s.genie_artist, s.genie_title, s.youtube_music_artist,
                s.youtube_music_title, s.youtube_url
         FROM song_info s
         WHERE EXISTS (
             SELECT 1 FROM crawling_period p
             WHERE p.song_id = s.id
               AND p.is_active = 1
               AND p.start_date <= ?
               AND p.end_date >= ?
         )
         ORDER BY s.id",
    )
    .bind(&day)
    .bind(&day)
    .fetch_all(pool)
    .await?;

    let songs = rows
        .iter()
        .map(|row| {
            Ok(SongInfo {
                id: row.try_get("id")?,
                genie_artist: row.try_get("genie_artist")?,
                genie_title: row.try_get("genie_title")?,
                youtube_music_artist: row.try_get("youtube_music_artist")?,
                youtube_music_title: row.try_get("youtube_music_title")?,
                youtube_url: row.try_get("youtube_url")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    log::info!("{} song(s) have an active crawling period on {}", songs.len(), date);
    Ok(songs)
}

/// Search targets for every active song on `date`, for one platform or all.
/// Songs without data for a platform are left out for that platform.
pub async fn query_active_targets(
    pool: &SqlitePool,
    date: NaiveDate,
    platform: Option<Platform>,
) -> Result<Vec<SearchTarget>, DatabaseError> {
    let platforms = match platform {
        Some(platform) => vec![platform],
        None => vec![Platform::Genie, Platform::YoutubeMusic, Platform::Youtube],
    };
    let songs = query_active_songs(pool, date).await?;

    let mut targets = Vec::new();
    for platform in platforms {
        let before = targets.len();
        targets.extend(songs.iter().filter_map(|song| song.target_for(platform)));
        log::debug!("{} target(s) for {}", targets.len() - before, platform);
    }
    Ok(targets)
}
