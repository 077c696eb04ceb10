//! Business filtering of event records.

use crate::extract::EventRecord;
use std::collections::HashMap;

/// The page value marking a "track played" event.
pub const PLAY_ACTION: &str = "NextSong";

/// Reduce one file's event records to the plays that should be loaded.
///
/// Two passes, in order:
/// 1. Keep only records whose page is [`PLAY_ACTION`]; navigation and auth
///    events are discarded.
/// 2. Drop every record of any user id that appears two or more times in the
///    retained subset. This is a strict keep-only-singletons rule, not
///    first-occurrence deduplication: a user with two plays in the same file
///    contributes nothing from that file.
///
/// Output preserves the input order of the surviving records.
pub fn filter_play_events(records: Vec<EventRecord>) -> Vec<EventRecord> {
    let played: Vec<EventRecord> = records
        .into_iter()
        .filter(|record| record.page == PLAY_ACTION)
        .collect();

    let mut counts: HashMap<Option<i64>, usize> = HashMap::new();
    for record in &played {
        *counts.entry(record.user_id).or_insert(0) += 1;
    }

    played
        .into_iter()
        .filter(|record| counts[&record.user_id] == 1)
        .collect()
}
