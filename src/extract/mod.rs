//! Record extraction from source JSON files.
//!
//! Two source shapes exist: catalog files hold a single JSON object
//! describing one song and its artist, and event-log files hold
//! newline-delimited JSON with one user-activity record per line.

mod catalog;
mod events;

pub use catalog::{extract_catalog_file, ArtistRecord, SongRecord};
pub use events::{extract_event_file, EventExtraction, EventRecord};

use thiserror::Error;

/// Errors raised while reading and parsing a source file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
