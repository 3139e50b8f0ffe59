use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use error_stack::{IntoReport, ResultExt};

use crate::history::{HistoryError, HistoryResult, LineStore};

/// One `<key>.txt` file per key inside `root`, one id per line.
///
/// Key characters outside `[A-Za-z0-9_-]` are written as `%XX` per UTF-8
/// byte, so distinct keys always map to distinct files.
#[derive(Debug, Clone)]
pub struct FileLineStore {
    root: PathBuf,
}

impl FileLineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                file_name.push(char::from(byte));
            } else {
                file_name.push_str(&format!("%{:02X}", byte));
            }
        }
        self.root.join(format!("{}.txt", file_name))
    }
}

impl LineStore for FileLineStore {
    fn read_lines(&self, key: &str) -> HistoryResult<Vec<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(error) => Err(error)
                .into_report()
                .attach_printable(format!("Failed to read {}", path.display()))
                .change_context(HistoryError),
        }
    }

    fn append_lines(&mut self, key: &str, lines: &[String]) -> HistoryResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)
            .into_report()
            .attach_printable(format!("Failed to create directory {}", self.root.display()))
            .change_context(HistoryError)?;
        let path = self.path_for(key);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .into_report()
            .attach_printable(format!("Failed to open {}", path.display()))
            .change_context(HistoryError)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writeln!(writer, "{}", line)
                .into_report()
                .attach_printable(format!("Failed to write to {}", path.display()))
                .change_context(HistoryError)?;
        }
        let file = writer
            .into_inner()
            .map_err(|error| error.into_error())
            .into_report()
            .change_context(HistoryError)?;
        file.sync_all()
            .into_report()
            .attach_printable(format!("Failed to flush {}", path.display()))
            .change_context(HistoryError)?;
        Ok(())
    }
}
