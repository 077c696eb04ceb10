//! Warehouse table definitions.
//!
//! Column defaults mirror the reporting conventions downstream queries rely
//! on: unknown locations read 'Unknown', unknown subscription levels read
//! 'Free'.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, Schema, SqlType, Table};

/// Artists reference table, keyed by the catalog's own artist id.
const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text, default_value = Some("'Unknown'")),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_artists_name", "artist_name")],
};

/// Songs reference table, keyed by the catalog's own song id.
const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("song_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "artist_id",
            })
        ),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("duration", &SqlType::Real),
    ],
    indices: &[("idx_songs_title", "title")],
};

/// Users dimension. Subscription level is overwritten on conflict.
const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("user_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text),
        sqlite_column!("last_name", &SqlType::Text, default_value = Some("'unknown'")),
        sqlite_column!("gender", &SqlType::Text, default_value = Some("'U'")),
        sqlite_column!("level", &SqlType::Text, default_value = Some("'Free'")),
    ],
    indices: &[],
};

/// Calendar breakdown rows, one per retained play.
const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        sqlite_column!("time_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("start_time", &SqlType::Text),
        sqlite_column!("hour", &SqlType::Integer),
        sqlite_column!("day", &SqlType::Integer),
        sqlite_column!("week", &SqlType::Integer),
        sqlite_column!("month", &SqlType::Integer),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("weekday", &SqlType::Integer),
    ],
    indices: &[],
};

/// Play facts. song_id/artist_id are nullable: an unresolved catalog lookup
/// still yields a fact row carrying the raw title and artist name.
const PLAYS_TABLE: Table = Table {
    name: "plays",
    columns: &[
        sqlite_column!("play_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("start_time_ms", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "user_id",
            })
        ),
        sqlite_column!("level", &SqlType::Text, default_value = Some("'Free'")),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "song_id",
            })
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "artist_id",
            })
        ),
        sqlite_column!("session_id", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text, default_value = Some("'Unknown'")),
        sqlite_column!("user_agent", &SqlType::Text),
        sqlite_column!("raw_song", &SqlType::Text),
        sqlite_column!("raw_artist", &SqlType::Text),
    ],
    indices: &[
        ("idx_plays_user", "user_id"),
        ("idx_plays_song", "song_id"),
    ],
};

/// The full warehouse schema, referenced tables first.
pub const WAREHOUSE_SCHEMA: Schema = Schema {
    version: 1,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        USERS_TABLE,
        TIME_TABLE,
        PLAYS_TABLE,
    ],
};
