use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use error_stack::{IntoReport, ResultExt};

use crate::config::AppConfig;

#[derive(Debug)]
pub struct CoverError;

impl fmt::Display for CoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cover image error")
    }
}

impl std::error::Error for CoverError {}

pub type CoverResult<T> = error_stack::Result<T, CoverError>;

pub fn genre_image_name(genre: &str) -> String {
    format!("{}.jpg", genre.to_lowercase().replace(' ', "_"))
}

/// `<images>/<genre>.jpg`, or the default cover when the genre has none.
pub fn cover_image_path(images_path: &Path, genre: &str) -> Option<PathBuf> {
    let genre_image = images_path.join(genre_image_name(genre));
    if genre_image.exists() {
        return Some(genre_image);
    }
    log::info!(
        "No image {} for genre {}, looking for the default one",
        genre_image.display(),
        genre
    );
    let default_image = images_path.join(AppConfig::DEFAULT_COVER_IMAGE);
    default_image.exists().then_some(default_image)
}

/// Base64 encoded cover of `genre`, `None` when no image is available.
pub fn load_cover(images_path: &Path, genre: &str) -> CoverResult<Option<String>> {
    let Some(path) = cover_image_path(images_path, genre) else {
        return Ok(None);
    };
    let bytes = fs::read(&path)
        .into_report()
        .attach_printable(format!("Failed to read {}", path.display()))
        .change_context(CoverError)?;
    Ok(Some(general_purpose::STANDARD.encode(bytes)))
}
