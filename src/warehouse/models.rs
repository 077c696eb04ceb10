//! Row types handed to the warehouse.

/// Resolved catalog identifiers for one play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub song_id: String,
    pub artist_id: String,
}

/// One user row. On conflict the warehouse overwrites only the
/// subscription level; identity fields keep their stored values.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

/// One play fact row. `song_id`/`artist_id` stay empty when the natural-key
/// lookup found no catalog match; the play is still recorded.
#[derive(Debug, Clone)]
pub struct PlayRow {
    /// Event timestamp, epoch milliseconds.
    pub start_time_ms: i64,
    pub user_id: i64,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub raw_song: Option<String>,
    pub raw_artist: Option<String>,
}

/// Per-table row counts, for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarehouseCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time_rows: usize,
    pub plays: usize,
}
