use chrono::{DateTime, Duration, Utc};

use crate::config::AppConfig;
use crate::sync::track::TrackRef;

/// Upper bound for the window, a century is far beyond any playlist.
const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// How far back a track may have been added to still count as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    days: i64,
}

impl LookbackWindow {
    /// Non-positive values fall back to the default window.
    pub fn from_days(days: i64) -> Self {
        if days <= 0 {
            log::warn!(
                "Lookback window of {} days is not positive, using {} days",
                days,
                AppConfig::DEFAULT_LOOKBACK_DAYS
            );
            return Self::default();
        }
        Self {
            days: days.min(MAX_LOOKBACK_DAYS),
        }
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn duration(&self) -> Duration {
        Duration::days(self.days)
    }

    /// Oldest instant still inside the window, inclusive.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(self.duration())
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self {
            days: AppConfig::DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// Parses a provider timestamp into UTC. Offsets other than `Z` are
/// normalised.
pub fn parse_added_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|added_at| added_at.with_timezone(&Utc))
}

/// Keeps the tracks added at or after `now - window`, preserving order.
///
/// Tracks without a timestamp, or with one that cannot be parsed, are
/// dropped with a warning.
pub fn select_recent(
    tracks: Vec<TrackRef>,
    window: LookbackWindow,
    now: DateTime<Utc>,
) -> Vec<TrackRef> {
    let cutoff = window.cutoff(now);
    tracks
        .into_iter()
        .filter(|track| {
            let Some(raw) = track.added_at.as_deref() else {
                log::warn!("Track {} has no added date, skipping", track.display_name());
                return false;
            };
            let Some(added_at) = parse_added_at(raw) else {
                log::warn!(
                    "Could not parse added date {:?} of track {}, skipping",
                    raw,
                    track.display_name()
                );
                return false;
            };
            match cutoff {
                Some(cutoff) => added_at >= cutoff,
                None => true,
            }
        })
        .collect()
}
