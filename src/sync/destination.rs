use std::fmt;

use chrono::{DateTime, Datelike, Month, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::sync::track::Collection;

/// Calendar granularity used to partition destination playlists.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeriodGranularity {
    #[default]
    Year,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    /// Year and month number, 1 based.
    Month(i32, u32),
}

impl Period {
    pub fn current(granularity: PeriodGranularity, now: DateTime<Utc>) -> Self {
        match granularity {
            PeriodGranularity::Year => Period::Year(now.year()),
            PeriodGranularity::Month => Period::Month(now.year(), now.month()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{}", year),
            Period::Month(year, month) => {
                match u8::try_from(*month).ok().and_then(|m| Month::try_from(m).ok()) {
                    Some(month) => write!(f, "{} {}", month.name(), year),
                    None => write!(f, "{:02} {}", month, year),
                }
            }
        }
    }
}

/// What the caller has to do to obtain the destination of a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Existing { id: String, name: String },
    Create { name: String, description: String },
}

impl Destination {
    pub fn name(&self) -> &str {
        match self {
            Destination::Existing { name, .. } | Destination::Create { name, .. } => name,
        }
    }
}

pub fn normalize_category(category: &str) -> String {
    category.replace('&', "AND").replace('_', " ").to_uppercase()
}

pub fn destination_name(category: &str, period: Period) -> String {
    format!("{} {}", normalize_category(category), period)
}

pub fn destination_description(category: &str) -> String {
    format!(
        "Playlist generated by SpotiBOT for {}",
        normalize_category(category)
    )
}

/// Looks the destination of `(category, period)` up by exact name among the
/// owner's playlists. Creation is left to the caller.
pub fn resolve_destination(
    category: &str,
    period: Period,
    existing_collections: &[Collection],
) -> Destination {
    let name = destination_name(category, period);
    match existing_collections
        .iter()
        .find(|collection| collection.name == name)
    {
        Some(collection) => Destination::Existing {
            id: collection.id.clone(),
            name,
        },
        None => Destination::Create {
            description: destination_description(category),
            name,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn collection(id: &str, name: &str) -> Collection {
        Collection {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_name_is_stable() {
        let first = resolve_destination("rock", Period::Year(2025), &[]);
        let existing = vec![collection("1", "POP 2025"), collection("2", "ROCK 2024")];
        let second = resolve_destination("rock", Period::Year(2025), &existing);
        assert_eq!(first.name(), "ROCK 2025");
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("drum&bass"), "DRUMANDBASS");
        assert_eq!(normalize_category("deep_house"), "DEEP HOUSE");
    }

    #[test]
    fn test_monthly_name() {
        let now = Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap();
        let period = Period::current(PeriodGranularity::Month, now);
        assert_eq!(destination_name("techno", period), "TECHNO February 2025");
        let period = Period::current(PeriodGranularity::Year, now);
        assert_eq!(destination_name("techno", period), "TECHNO 2025");
    }

    #[test]
    fn test_resolve_existing_by_exact_name() {
        let existing = vec![
            collection("a", "rock 2025"),
            collection("b", "ROCK 2025"),
            collection("c", "ROCK 2025"),
        ];
        let destination = resolve_destination("rock", Period::Year(2025), &existing);
        assert_eq!(
            destination,
            Destination::Existing {
                id: "b".to_string(),
                name: "ROCK 2025".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_missing_asks_for_creation() {
        let destination = resolve_destination("hip_hop", Period::Year(2025), &[]);
        assert_eq!(
            destination,
            Destination::Create {
                name: "HIP HOP 2025".to_string(),
                description: "Playlist generated by SpotiBOT for HIP HOP".to_string(),
            }
        );
    }
}
