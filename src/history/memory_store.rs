use std::collections::HashMap;

use error_stack::Report;

use crate::history::{HistoryError, HistoryResult, LineStore};

/// In-memory line store, optionally failing every append or only the
/// appends to keys starting with `fail_key_prefix`.
#[derive(Debug, Default, Clone)]
pub struct MemoryLineStore {
    pub lines: HashMap<String, Vec<String>>,
    pub fail_appends: bool,
    pub fail_key_prefix: Option<String>,
}

impl LineStore for MemoryLineStore {
    fn read_lines(&self, key: &str) -> HistoryResult<Vec<String>> {
        Ok(self.lines.get(key).cloned().unwrap_or_default())
    }

    fn append_lines(&mut self, key: &str, lines: &[String]) -> HistoryResult<()> {
        let prefix_fails = self
            .fail_key_prefix
            .as_deref()
            .is_some_and(|prefix| key.starts_with(prefix));
        if self.fail_appends || prefix_fails {
            return Err(Report::new(HistoryError).attach_printable("Disk is full"));
        }
        self.lines
            .entry(key.to_string())
            .or_default()
            .extend_from_slice(lines);
        Ok(())
    }
}
