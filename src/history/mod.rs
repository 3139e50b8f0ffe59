use std::collections::HashSet;
use std::fmt;

use error_stack::ResultExt;

use crate::config::AppConfig;
use crate::sync::track::TrackId;

pub mod file_store;
#[cfg(test)]
pub mod memory_store;

#[derive(Debug)]
pub struct HistoryError;

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("History error")
    }
}

impl std::error::Error for HistoryError {}

pub type HistoryResult<T> = error_stack::Result<T, HistoryError>;

/// Durable, append-only text storage addressed by key.
pub trait LineStore {
    /// Lines stored under `key`, empty when nothing was ever written.
    fn read_lines(&self, key: &str) -> HistoryResult<Vec<String>>;

    /// Appends `lines` under `key`. Returns only once the lines are flushed.
    fn append_lines(&mut self, key: &str, lines: &[String]) -> HistoryResult<()>;
}

/// Per-source history and global registry of delivered track ids.
///
/// Both are strictly additive: callers must only append ids that are not
/// already present, the store keeps whatever it is given.
#[derive(Debug)]
pub struct TrackHistory<S: LineStore> {
    store: S,
}

impl<S: LineStore> TrackHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_source_history(&self, source_key: &str) -> HistoryResult<HashSet<TrackId>> {
        self.load(&Self::source_storage_key(source_key))
    }

    pub fn append_source_history(&mut self, source_key: &str, ids: &[TrackId]) -> HistoryResult<()> {
        self.store
            .append_lines(&Self::source_storage_key(source_key), ids)
            .attach_printable_lazy(|| format!("Failed to extend the history of {}", source_key))
    }

    pub fn load_global_registry(&self) -> HistoryResult<HashSet<TrackId>> {
        self.load(AppConfig::GLOBAL_REGISTRY_KEY)
    }

    pub fn append_global_registry(&mut self, ids: &[TrackId]) -> HistoryResult<()> {
        self.store
            .append_lines(AppConfig::GLOBAL_REGISTRY_KEY, ids)
            .attach_printable("Failed to extend the global registry")
    }

    fn load(&self, key: &str) -> HistoryResult<HashSet<TrackId>> {
        Ok(self
            .store
            .read_lines(key)?
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Source histories live under their own prefix so that no playlist key
    /// can address the global registry.
    fn source_storage_key(source_key: &str) -> String {
        format!("source_{}_tracks", source_key)
    }
}

#[cfg(test)]
mod tests {
    use super::memory_store::MemoryLineStore;
    use super::*;

    fn ids(values: &[&str]) -> Vec<TrackId> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_missing_history_is_empty() {
        let history = TrackHistory::new(MemoryLineStore::default());
        assert!(history.load_source_history("unknown").unwrap().is_empty());
        assert!(history.load_global_registry().unwrap().is_empty());
    }

    #[test]
    fn test_source_and_global_are_separate() {
        let mut history = TrackHistory::new(MemoryLineStore::default());
        history.append_source_history("abc", &ids(&["1", "2"])).unwrap();
        history.append_global_registry(&ids(&["3"])).unwrap();
        history.append_source_history("abc", &ids(&["4"])).unwrap();

        let source = history.load_source_history("abc").unwrap();
        assert_eq!(source.len(), 3);
        assert!(source.contains("4"));
        assert!(!source.contains("3"));
        let global = history.load_global_registry().unwrap();
        assert_eq!(global.len(), 1);
        assert!(history.load_source_history("other").unwrap().is_empty());
    }

    #[test]
    fn test_only_empty_lines_are_ignored() {
        let mut store = MemoryLineStore::default();
        store
            .append_lines("source_abc_tracks", &ids(&["1", "", " 2 "]))
            .unwrap();
        let history = TrackHistory::new(store);
        let source = history.load_source_history("abc").unwrap();
        let expected: HashSet<TrackId> = ids(&["1", " 2 "]).into_iter().collect();
        assert_eq!(source, expected);
        assert!(!source.contains("2"));
    }

    #[test]
    fn test_source_named_like_the_registry_stays_separate() {
        let mut history = TrackHistory::new(MemoryLineStore::default());
        history.append_global_registry(&ids(&["1", "2"])).unwrap();
        history.append_source_history("global", &ids(&["3"])).unwrap();

        let expected: HashSet<TrackId> = ids(&["1", "2"]).into_iter().collect();
        assert_eq!(history.load_global_registry().unwrap(), expected);
        let source = history.load_source_history("global").unwrap();
        assert_eq!(source.len(), 1);
        assert!(source.contains("3"));
        assert_eq!(
            history.store().lines.get(AppConfig::GLOBAL_REGISTRY_KEY).map(Vec::len),
            Some(2)
        );
    }
}
