//! Event-log file extraction.

use super::ExtractError;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use tracing::warn;

/// One user-activity record projected from an event-log line.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event timestamp, epoch milliseconds.
    pub ts: i64,
    /// None when the source carries an empty user id (anonymous session).
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub page: String,
    pub song: Option<String>,
    pub artist: Option<String>,
    /// Track duration in seconds, present on play records.
    pub length: Option<f64>,
}

/// Result of extracting one event-log file.
#[derive(Debug, Default)]
pub struct EventExtraction {
    pub records: Vec<EventRecord>,
    /// Lines that were not valid event JSON and were skipped.
    pub skipped_lines: usize,
}

/// Raw shape of one event-log line. Field names follow the source logs.
#[derive(Debug, Deserialize)]
struct EventLine {
    ts: i64,
    #[serde(rename = "userId", deserialize_with = "lenient_user_id", default)]
    user_id: Option<i64>,
    #[serde(rename = "firstName")]
    first_name: Option<String>,
    #[serde(rename = "lastName")]
    last_name: Option<String>,
    gender: Option<String>,
    level: String,
    #[serde(rename = "sessionId")]
    session_id: i64,
    location: Option<String>,
    #[serde(rename = "userAgent")]
    user_agent: Option<String>,
    page: String,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
}

/// The source logs carry user ids either as integers or as numeric strings,
/// with the empty string standing in for "no user".
fn lenient_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid user id: {:?}", s))),
    }
}

/// Parse one newline-delimited event-log file.
///
/// Malformed lines are skipped and counted, never fatal to the file; only
/// failing to read the file at all is an error. Blank lines are ignored.
pub fn extract_event_file(path: &Path) -> Result<EventExtraction, ExtractError> {
    let content = std::fs::read_to_string(path)?;

    let mut extraction = EventExtraction::default();
    for (line_index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EventLine>(line) {
            Ok(raw) => extraction.records.push(EventRecord {
                ts: raw.ts,
                user_id: raw.user_id,
                first_name: raw.first_name,
                last_name: raw.last_name,
                gender: raw.gender,
                level: raw.level,
                session_id: raw.session_id,
                location: raw.location,
                user_agent: raw.user_agent,
                page: raw.page,
                song: raw.song,
                artist: raw.artist,
                length: raw.length,
            }),
            Err(err) => {
                warn!(
                    "Skipping malformed line {} in {}: {}",
                    line_index + 1,
                    path.display(),
                    err
                );
                extraction.skipped_lines += 1;
            }
        }
    }
    Ok(extraction)
}
