//! SQLite-backed warehouse.

use super::models::{PlayRow, SongRef, UserRow, WarehouseCounts};
use crate::extract::{ArtistRecord, SongRecord};
use crate::sqlite_persistence::Schema;
use crate::timeparts::TimeBreakdown;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed warehouse. A single writer connection is assumed; the
/// loader is the sole process touching the database during a run.
#[derive(Clone)]
pub struct SqliteWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWarehouse {
    /// Open (or create) the warehouse database and ensure the given schema
    /// exists. The schema value is the only place table structure is defined.
    pub fn open<P: AsRef<Path>>(db_path: P, schema: &Schema) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open warehouse database")?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        schema.ensure(&conn)?;

        let counts = Self::counts_inner(&conn)?;
        info!(
            "Opened warehouse: {} songs, {} artists, {} users, {} plays",
            counts.songs, counts.artists, counts.users, counts.plays
        );

        Ok(SqliteWarehouse {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run one file's rows as a single unit of work. If the closure returns
    /// an error the transaction is dropped and everything written inside it
    /// is rolled back; nothing from the file becomes visible.
    pub fn with_file_transaction<T>(&self, f: impl FnOnce(&FileTx) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        let file_tx = FileTx { tx };
        let value = f(&file_tx)?;
        file_tx.tx.commit()?;
        Ok(value)
    }

    /// Resolve a (title, artist name, duration) triple to catalog
    /// identifiers. See [`resolve_song_ref`] for match semantics.
    pub fn resolve_song_ref(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongRef>> {
        let conn = self.conn.lock().unwrap();
        resolve_song_ref(&conn, title, artist_name, duration)
    }

    /// Fetch one user row.
    pub fn get_user(&self, user_id: i64) -> Result<Option<UserRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT user_id, first_name, last_name, gender, level FROM users WHERE user_id = ?1",
        )?;
        let user = stmt
            .query_row(params![user_id], |row| {
                Ok(UserRow {
                    user_id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    gender: row.get(3)?,
                    level: row.get(4)?,
                })
            })
            .optional()?;
        Ok(user)
    }

    /// Fetch every play recorded for one user, oldest first.
    pub fn get_plays_for_user(&self, user_id: i64) -> Result<Vec<PlayRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT start_time_ms, user_id, level, song_id, artist_id, session_id,
                    location, user_agent, raw_song, raw_artist
             FROM plays WHERE user_id = ?1 ORDER BY start_time_ms",
        )?;
        let plays = stmt
            .query_map(params![user_id], |row| {
                Ok(PlayRow {
                    start_time_ms: row.get(0)?,
                    user_id: row.get(1)?,
                    level: row.get(2)?,
                    song_id: row.get(3)?,
                    artist_id: row.get(4)?,
                    session_id: row.get(5)?,
                    location: row.get(6)?,
                    user_agent: row.get(7)?,
                    raw_song: row.get(8)?,
                    raw_artist: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(plays)
    }

    /// Per-table row counts.
    pub fn counts(&self) -> Result<WarehouseCounts> {
        let conn = self.conn.lock().unwrap();
        Self::counts_inner(&conn)
    }

    fn counts_inner(conn: &Connection) -> Result<WarehouseCounts> {
        fn count(conn: &Connection, table: &str) -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                r.get(0)
            })?;
            Ok(n as usize)
        }
        Ok(WarehouseCounts {
            songs: count(conn, "songs")?,
            artists: count(conn, "artists")?,
            users: count(conn, "users")?,
            time_rows: count(conn, "time")?,
            plays: count(conn, "plays")?,
        })
    }
}

/// One file's unit of work. Dropping it without commit rolls back.
pub struct FileTx<'conn> {
    tx: Transaction<'conn>,
}

impl FileTx<'_> {
    pub fn insert_artist(&self, artist: &ArtistRecord) -> Result<()> {
        self.tx.execute(
            "INSERT INTO artists (artist_id, artist_name, location, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                artist.artist_id,
                artist.artist_name,
                artist.location,
                artist.latitude,
                artist.longitude
            ],
        )?;
        Ok(())
    }

    pub fn insert_song(&self, song: &SongRecord) -> Result<()> {
        self.tx.execute(
            "INSERT INTO songs (song_id, title, artist_id, year, duration)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                song.song_id,
                song.title,
                song.artist_id,
                song.year,
                song.duration
            ],
        )?;
        Ok(())
    }

    /// Insert a user, or refresh only the subscription level when the user
    /// already exists. Identity fields are never overwritten by later events.
    pub fn upsert_user(&self, user: &UserRow) -> Result<()> {
        self.tx.execute(
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
            params![
                user.user_id,
                user.first_name,
                user.last_name,
                user.gender,
                user.level
            ],
        )?;
        Ok(())
    }

    pub fn insert_time(&self, breakdown: &TimeBreakdown) -> Result<()> {
        self.tx.execute(
            "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                breakdown.start_time,
                breakdown.hour,
                breakdown.day,
                breakdown.week,
                breakdown.month,
                breakdown.year,
                breakdown.weekday
            ],
        )?;
        Ok(())
    }

    pub fn insert_play(&self, play: &PlayRow) -> Result<()> {
        self.tx.execute(
            "INSERT INTO plays (start_time_ms, user_id, level, song_id, artist_id,
                                session_id, location, user_agent, raw_song, raw_artist)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                play.start_time_ms,
                play.user_id,
                play.level,
                play.song_id,
                play.artist_id,
                play.session_id,
                play.location,
                play.user_agent,
                play.raw_song,
                play.raw_artist
            ],
        )?;
        Ok(())
    }

    pub fn resolve_song_ref(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongRef>> {
        resolve_song_ref(&self.tx, title, artist_name, duration)
    }
}

/// Exact-match lookup of (title, artist name, duration) against the catalog
/// tables. Duration compares with plain numeric equality, no tolerance.
/// Zero matches yield None; when the catalog holds more than one exact match
/// the first by song_id is returned, so results stay deterministic.
fn resolve_song_ref(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> Result<Option<SongRef>> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.song_id, s.artist_id
         FROM songs s JOIN artists a ON a.artist_id = s.artist_id
         WHERE s.title = ?1 AND a.artist_name = ?2 AND s.duration = ?3
         ORDER BY s.song_id
         LIMIT 1",
    )?;
    let song_ref = stmt
        .query_row(params![title, artist_name, duration], |row| {
            Ok(SongRef {
                song_id: row.get(0)?,
                artist_id: row.get(1)?,
            })
        })
        .optional()?;
    Ok(song_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::WAREHOUSE_SCHEMA;
    use anyhow::bail;
    use tempfile::TempDir;

    struct TestWarehouse {
        warehouse: SqliteWarehouse,
        _temp_dir: TempDir, // Keep temp dir alive
    }

    fn create_test_warehouse() -> TestWarehouse {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("warehouse.db");
        let warehouse = SqliteWarehouse::open(&db_path, &WAREHOUSE_SCHEMA).unwrap();
        TestWarehouse {
            warehouse,
            _temp_dir: temp_dir,
        }
    }

    fn sample_artist(artist_id: &str, name: &str) -> ArtistRecord {
        ArtistRecord {
            artist_id: artist_id.to_string(),
            artist_name: name.to_string(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    fn sample_song(song_id: &str, title: &str, artist_id: &str, duration: f64) -> SongRecord {
        SongRecord {
            song_id: song_id.to_string(),
            title: title.to_string(),
            artist_id: artist_id.to_string(),
            year: Some(2004),
            duration,
        }
    }

    fn load_catalog_pair(warehouse: &SqliteWarehouse, song: &SongRecord, artist: &ArtistRecord) {
        warehouse
            .with_file_transaction(|tx| {
                tx.insert_artist(artist)?;
                tx.insert_song(song)?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_resolve_exact_match_and_miss() {
        let test = create_test_warehouse();
        let warehouse = &test.warehouse;

        load_catalog_pair(
            warehouse,
            &sample_song("SOSAMP1", "Test Track", "AR001", 210.5),
            &sample_artist("AR001", "Test Artist"),
        );

        let hit = warehouse
            .resolve_song_ref("Test Track", "Test Artist", 210.5)
            .unwrap()
            .unwrap();
        assert_eq!(hit.song_id, "SOSAMP1");
        assert_eq!(hit.artist_id, "AR001");

        let miss = warehouse
            .resolve_song_ref("Other Track", "Test Artist", 210.5)
            .unwrap();
        assert!(miss.is_none());

        // Duration equality is exact, no tolerance.
        let near_miss = warehouse
            .resolve_song_ref("Test Track", "Test Artist", 210.501)
            .unwrap();
        assert!(near_miss.is_none());
    }

    #[test]
    fn test_resolve_multiple_matches_returns_first_by_song_id() {
        let test = create_test_warehouse();
        let warehouse = &test.warehouse;

        load_catalog_pair(
            warehouse,
            &sample_song("SOZZZ99", "Same Song", "AR010", 180.0),
            &sample_artist("AR010", "Same Artist"),
        );
        warehouse
            .with_file_transaction(|tx| {
                // Second song with an identical natural key under the same artist.
                tx.insert_song(&sample_song("SOAAA01", "Same Song", "AR010", 180.0))
            })
            .unwrap();

        let hit = warehouse
            .resolve_song_ref("Same Song", "Same Artist", 180.0)
            .unwrap()
            .unwrap();
        assert_eq!(hit.song_id, "SOAAA01");
    }

    #[test]
    fn test_upsert_user_overwrites_level_only() {
        let test = create_test_warehouse();
        let warehouse = &test.warehouse;

        warehouse
            .with_file_transaction(|tx| {
                tx.upsert_user(&UserRow {
                    user_id: 26,
                    first_name: Some("Ryan".to_string()),
                    last_name: Some("Smith".to_string()),
                    gender: Some("M".to_string()),
                    level: "free".to_string(),
                })?;
                tx.upsert_user(&UserRow {
                    user_id: 26,
                    first_name: Some("Somebody".to_string()),
                    last_name: Some("Else".to_string()),
                    gender: Some("F".to_string()),
                    level: "paid".to_string(),
                })
            })
            .unwrap();

        let user = warehouse.get_user(26).unwrap().unwrap();
        assert_eq!(user.level, "paid");
        assert_eq!(user.first_name.as_deref(), Some("Ryan"));
        assert_eq!(user.last_name.as_deref(), Some("Smith"));
        assert_eq!(warehouse.counts().unwrap().users, 1);
    }

    #[test]
    fn test_file_transaction_rolls_back_on_error() {
        let test = create_test_warehouse();
        let warehouse = &test.warehouse;

        let result: Result<()> = warehouse.with_file_transaction(|tx| {
            tx.insert_artist(&sample_artist("AR900", "Vanishing"))?;
            bail!("simulated failure on a later row");
        });
        assert!(result.is_err());
        assert_eq!(warehouse.counts().unwrap().artists, 0);
    }

    #[test]
    fn test_duplicate_song_id_is_a_constraint_error() {
        let test = create_test_warehouse();
        let warehouse = &test.warehouse;

        load_catalog_pair(
            warehouse,
            &sample_song("SODUPE1", "Once", "AR020", 100.0),
            &sample_artist("AR020", "Unique"),
        );
        let result = warehouse
            .with_file_transaction(|tx| tx.insert_song(&sample_song("SODUPE1", "Twice", "AR020", 100.0)));
        assert!(result.is_err());
    }

    #[test]
    fn test_nullable_song_ref_play_is_recorded() {
        let test = create_test_warehouse();
        let warehouse = &test.warehouse;

        warehouse
            .with_file_transaction(|tx| {
                tx.upsert_user(&UserRow {
                    user_id: 7,
                    first_name: None,
                    last_name: None,
                    gender: None,
                    level: "free".to_string(),
                })?;
                tx.insert_play(&PlayRow {
                    start_time_ms: 1541990258796,
                    user_id: 7,
                    level: "free".to_string(),
                    song_id: None,
                    artist_id: None,
                    session_id: 583,
                    location: None,
                    user_agent: Some("Mozilla/5.0".to_string()),
                    raw_song: Some("Sehr kosmisch".to_string()),
                    raw_artist: Some("Harmonia".to_string()),
                })
            })
            .unwrap();

        let plays = warehouse.get_plays_for_user(7).unwrap();
        assert_eq!(plays.len(), 1);
        assert!(plays[0].song_id.is_none());
        assert_eq!(plays[0].raw_song.as_deref(), Some("Sehr kosmisch"));
    }
}
