//! Load orchestration: directory walk, per-file transform, per-file commit.

use crate::collect::collect_json_files;
use crate::extract::{extract_catalog_file, extract_event_file, EventRecord};
use crate::filter::filter_play_events;
use crate::timeparts::TimeBreakdown;
use crate::warehouse::{PlayRow, SqliteWarehouse, UserRow};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};

/// Counters accumulated over one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub catalog_files: usize,
    pub event_files: usize,
    /// Files whose unit of work failed and was rolled back.
    pub failed_files: usize,
    /// Malformed event-log lines skipped during extraction.
    pub skipped_lines: usize,
    pub songs_inserted: usize,
    pub artists_inserted: usize,
    pub users_upserted: usize,
    pub time_rows_inserted: usize,
    pub plays_inserted: usize,
    /// Plays whose natural-key lookup found no catalog match.
    pub unresolved_plays: usize,
}

/// Per-event-file counters, merged into [`LoadStats`] after commit.
#[derive(Debug, Default, Clone, Copy)]
struct EventFileCounts {
    users: usize,
    time_rows: usize,
    plays: usize,
    unresolved: usize,
}

/// Drives a full load: the catalog tree first, then the event-log tree.
pub struct Loader {
    warehouse: SqliteWarehouse,
    /// Abort the run on the first failed file instead of continuing.
    fail_fast: bool,
}

impl Loader {
    pub fn new(warehouse: SqliteWarehouse, fail_fast: bool) -> Self {
        Self {
            warehouse,
            fail_fast,
        }
    }

    /// Run a complete load. The catalog tree is fully committed before the
    /// first event file is read, so every natural-key lookup sees the whole
    /// catalog.
    pub fn run(&self, catalog_dir: &Path, events_dir: &Path) -> Result<LoadStats> {
        let mut stats = LoadStats::default();
        self.process_tree(catalog_dir, &mut stats, Self::load_catalog_file)?;
        self.process_tree(events_dir, &mut stats, Self::load_event_file)?;

        info!(
            "Load complete: {} songs, {} artists, {} users, {} time rows, {} plays \
             ({} unresolved), {} failed files, {} skipped lines",
            stats.songs_inserted,
            stats.artists_inserted,
            stats.users_upserted,
            stats.time_rows_inserted,
            stats.plays_inserted,
            stats.unresolved_plays,
            stats.failed_files,
            stats.skipped_lines
        );
        Ok(stats)
    }

    fn process_tree(
        &self,
        root: &Path,
        stats: &mut LoadStats,
        load_file: fn(&Self, &Path, &mut LoadStats) -> Result<()>,
    ) -> Result<()> {
        let files = collect_json_files(root);
        info!("{} files found in {}", files.len(), root.display());
        if files.is_empty() {
            info!("0/0 files processed");
            return Ok(());
        }

        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            match load_file(self, file, stats) {
                Ok(()) => {}
                Err(err) => {
                    error!("Failed to process {}: {:#}", file.display(), err);
                    stats.failed_files += 1;
                    if self.fail_fast {
                        return Err(err);
                    }
                }
            }
            info!("{}/{} files processed", index + 1, total);
        }
        Ok(())
    }

    /// Load one catalog file: exactly one (song, artist) pair, one commit.
    fn load_catalog_file(&self, path: &Path, stats: &mut LoadStats) -> Result<()> {
        let (song, artist) =
            extract_catalog_file(path).with_context(|| format!("extracting {}", path.display()))?;

        self.warehouse.with_file_transaction(|tx| {
            tx.insert_artist(&artist)?;
            tx.insert_song(&song)?;
            Ok(())
        })?;

        stats.catalog_files += 1;
        stats.songs_inserted += 1;
        stats.artists_inserted += 1;
        Ok(())
    }

    /// Load one event-log file: extract, filter, decompose, resolve, and
    /// persist all surviving rows under a single commit.
    fn load_event_file(&self, path: &Path, stats: &mut LoadStats) -> Result<()> {
        let extraction =
            extract_event_file(path).with_context(|| format!("extracting {}", path.display()))?;
        stats.skipped_lines += extraction.skipped_lines;

        let plays = filter_play_events(extraction.records);

        let counts = self.warehouse.with_file_transaction(|tx| {
            let mut counts = EventFileCounts::default();
            for record in &plays {
                let Some(user_id) = record.user_id else {
                    warn!(
                        "Skipping play without a user id at ts {} in {}",
                        record.ts,
                        path.display()
                    );
                    continue;
                };
                let Some(breakdown) = TimeBreakdown::from_epoch_millis(record.ts) else {
                    warn!(
                        "Skipping play with out-of-range timestamp {} in {}",
                        record.ts,
                        path.display()
                    );
                    continue;
                };

                tx.insert_time(&breakdown)?;
                counts.time_rows += 1;

                tx.upsert_user(&UserRow {
                    user_id,
                    first_name: record.first_name.clone(),
                    last_name: record.last_name.clone(),
                    gender: record.gender.clone(),
                    level: record.level.clone(),
                })?;
                counts.users += 1;

                let song_ref = self.resolve_record(tx, record)?;
                if song_ref.is_none() {
                    counts.unresolved += 1;
                }
                let (song_id, artist_id) = match song_ref {
                    Some(r) => (Some(r.song_id), Some(r.artist_id)),
                    None => (None, None),
                };

                tx.insert_play(&PlayRow {
                    start_time_ms: record.ts,
                    user_id,
                    level: record.level.clone(),
                    song_id,
                    artist_id,
                    session_id: record.session_id,
                    location: record.location.clone(),
                    user_agent: record.user_agent.clone(),
                    raw_song: record.song.clone(),
                    raw_artist: record.artist.clone(),
                })?;
                counts.plays += 1;
            }
            Ok(counts)
        })?;

        stats.event_files += 1;
        stats.users_upserted += counts.users;
        stats.time_rows_inserted += counts.time_rows;
        stats.plays_inserted += counts.plays;
        stats.unresolved_plays += counts.unresolved;
        Ok(())
    }

    /// A record missing any component of the natural key cannot match.
    fn resolve_record(
        &self,
        tx: &crate::warehouse::FileTx,
        record: &EventRecord,
    ) -> Result<Option<crate::warehouse::SongRef>> {
        match (&record.song, &record.artist, record.length) {
            (Some(song), Some(artist), Some(length)) => tx.resolve_song_ref(song, artist, length),
            _ => Ok(None),
        }
    }
}
