//! Catalog file extraction.

use super::ExtractError;
use serde::Deserialize;
use std::path::Path;

/// One song row projected from a catalog file.
#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// None when the source carries the 0 placeholder for an unknown year.
    pub year: Option<i32>,
    /// Duration in seconds.
    pub duration: f64,
}

/// One artist row projected from a catalog file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub artist_name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Raw shape of a catalog file. Field names follow the source files; the
/// identifying fields are mandatory, so a file missing any of them fails
/// deserialization outright.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    song_id: String,
    title: String,
    artist_id: String,
    artist_name: String,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    artist_location: Option<String>,
    #[serde(default)]
    artist_latitude: Option<f64>,
    #[serde(default)]
    artist_longitude: Option<f64>,
}

/// Parse one catalog file into its (song, artist) pair.
///
/// The file must be a single JSON object. A file that is not valid JSON or
/// lacks one of the required identifying fields is an error for the whole
/// file.
pub fn extract_catalog_file(path: &Path) -> Result<(SongRecord, ArtistRecord), ExtractError> {
    let content = std::fs::read_to_string(path)?;
    let raw: CatalogFile = serde_json::from_str(&content)?;

    let song = SongRecord {
        song_id: raw.song_id,
        title: raw.title,
        artist_id: raw.artist_id.clone(),
        year: if raw.year == 0 { None } else { Some(raw.year) },
        duration: raw.duration,
    };
    let artist = ArtistRecord {
        artist_id: raw.artist_id,
        artist_name: raw.artist_name,
        location: raw.artist_location.filter(|l| !l.is_empty()),
        latitude: raw.artist_latitude,
        longitude: raw.artist_longitude,
    };
    Ok((song, artist))
}
