use std::fmt;
use std::fs;
use std::path::Path;

use error_stack::{IntoReport, Report, ResultExt};
use url::Url;

use crate::sync::track::{Category, SourcePlaylist};

#[derive(Debug)]
pub struct PlaylistsError;

impl fmt::Display for PlaylistsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Playlists file error")
    }
}

impl std::error::Error for PlaylistsError {}

pub type PlaylistsResult<T> = error_stack::Result<T, PlaylistsError>;

/// Reads the `<playlist url> <genre>` file that maps genres to the
/// playlists they follow.
pub fn load_playlists(path: &Path) -> PlaylistsResult<Vec<Category>> {
    if !path.exists() {
        return Err(Report::new(PlaylistsError).attach_printable(format!(
            "The file {} does not exist. Create it with one `<playlist url> <genre>` per line",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)
        .into_report()
        .attach_printable(format!("Failed to read {}", path.display()))
        .change_context(PlaylistsError)?;
    let categories = parse_playlists(&content);
    if categories.is_empty() {
        return Err(Report::new(PlaylistsError)
            .attach_printable(format!("{} has no valid playlist line", path.display())));
    }
    Ok(categories)
}

/// Groups the playlists of every valid line by genre, keeping the order in
/// which genres first appear. Malformed lines are skipped.
pub fn parse_playlists(content: &str) -> Vec<Category> {
    let mut categories: Vec<Category> = vec![];
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        let (url, genre) = (parts[0], parts[1]);
        let Some(key) = playlist_id(url) else {
            log::warn!("Skipping line without a playlist url: {}", line.trim());
            continue;
        };
        let source = SourcePlaylist {
            key,
            url: url.to_string(),
        };
        match categories.iter_mut().find(|category| category.label == genre) {
            Some(category) => category.sources.push(source),
            None => {
                let mut category = Category::new(genre);
                category.sources.push(source);
                categories.push(category);
            }
        }
    }
    categories
}

/// Extracts the bare id from an `open.spotify.com/playlist/<id>` url or a
/// `spotify:playlist:<id>` uri.
pub fn playlist_id(value: &str) -> Option<String> {
    if let Some(id) = value.strip_prefix("spotify:playlist:") {
        return (!id.is_empty()).then(|| id.to_string());
    }
    let url = Url::parse(value).ok()?;
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "playlist")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
