use std::collections::{HashMap, HashSet};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::sync::track::{TrackId, TrackRef};

/// Which occurrence represents an id that several sources share.
///
/// Either way the surviving track keeps the position of the first
/// occurrence, only the payload (added date, uri) differs.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MergePolicy {
    First,
    #[default]
    Last,
}

/// Order of the two per-source filters. Both are pure filters, so the
/// selected tracks are the same; only the intermediate counts differ.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FilterOrder {
    #[default]
    NoveltyFirst,
    RecencyFirst,
}

pub fn exclude_seen(tracks: Vec<TrackRef>, seen_ids: &HashSet<TrackId>) -> Vec<TrackRef> {
    tracks
        .into_iter()
        .filter(|track| !seen_ids.contains(&track.id))
        .collect()
}

pub fn dedupe_within_batch(tracks: Vec<TrackRef>, policy: MergePolicy) -> Vec<TrackRef> {
    let mut positions: HashMap<TrackId, usize> = HashMap::new();
    let mut unique: Vec<TrackRef> = Vec::with_capacity(tracks.len());
    for track in tracks {
        match positions.get(&track.id) {
            Some(&position) => {
                if policy == MergePolicy::Last {
                    unique[position] = track;
                }
            }
            None => {
                positions.insert(track.id.clone(), unique.len());
                unique.push(track);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, added_at: &str) -> TrackRef {
        TrackRef::new(id, Some(added_at.to_string()))
    }

    #[test]
    fn test_exclude_seen() {
        let seen: HashSet<TrackId> = ["b".to_string()].into_iter().collect();
        let tracks = vec![
            track("a", "2025-01-01T00:00:00Z"),
            track("b", "2025-01-01T00:00:00Z"),
            track("c", "2025-01-01T00:00:00Z"),
        ];
        let fresh = exclude_seen(tracks, &seen);
        let ids: Vec<_> = fresh.iter().map(|track| track.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_exclude_seen_uses_exact_ids() {
        let seen: HashSet<TrackId> = ["Abc".to_string()].into_iter().collect();
        let fresh = exclude_seen(vec![track("abc", "2025-01-01T00:00:00Z")], &seen);
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_dedupe_last_wins_keeps_first_position() {
        let tracks = vec![
            track("x", "2025-01-01T00:00:00Z"),
            track("y", "2025-01-02T00:00:00Z"),
            track("x", "2025-01-03T00:00:00Z"),
        ];
        let unique = dedupe_within_batch(tracks, MergePolicy::Last);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, "x");
        assert_eq!(unique[0].added_at.as_deref(), Some("2025-01-03T00:00:00Z"));
        assert_eq!(unique[1].id, "y");
    }

    #[test]
    fn test_dedupe_first_wins() {
        let tracks = vec![
            track("x", "2025-01-01T00:00:00Z"),
            track("x", "2025-01-03T00:00:00Z"),
        ];
        let unique = dedupe_within_batch(tracks, MergePolicy::First);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].added_at.as_deref(), Some("2025-01-01T00:00:00Z"));
    }
}
