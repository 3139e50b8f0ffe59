use serde::{Deserialize, Serialize};

pub type TrackId = String;

/// A track as reported by a source playlist.
///
/// `added_at` is kept as the raw string the provider returned; it is only
/// parsed by the recency filter so that an unparseable value is handled
/// exactly like a missing one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrackRef {
    pub id: TrackId,
    pub added_at: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
}

impl TrackRef {
    pub fn new(id: impl Into<TrackId>, added_at: Option<String>) -> Self {
        Self {
            id: id.into(),
            added_at,
            uri: None,
            name: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A playlist owned by the current user, as listed by the provider.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub name: String,
}

/// A followed playlist feeding one category.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SourcePlaylist {
    /// Stable key used for the source history, the bare playlist id.
    pub key: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub sources: Vec<SourcePlaylist>,
}

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sources: vec![],
        }
    }
}
