// storage/mod.rs
// Database operations module

pub mod catalog;
pub mod migrations;
pub mod pool;
pub mod records;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use catalog::{
    insert_crawling_period, insert_song_info, query_active_songs, query_active_targets, SongInfo,
};
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use records::{query_records, record_revision, RecordFilter, RecordStore, SqliteRecordStore};
