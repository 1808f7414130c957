//! Persisted input history.
//!
//! Command-line and search inputs are logged to plain text files, one
//! entry per line, newest last. The in-memory entries double as the
//! "working lines" that search wraparound walks through.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// An append-only line log, optionally backed by a file.
#[derive(Debug, Default)]
pub struct History {
    path: Option<PathBuf>,
    entries: Vec<String>,
}

impl History {
    /// A history that is not persisted anywhere.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load a history file. A missing file yields an empty history;
    /// the file is created on first append.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match File::open(&path) {
            Ok(file) => BufReader::new(file)
                .lines()
                .map_while(Result::ok)
                .collect(),
            Err(_) => Vec::new(),
        };
        Self { path: Some(path), entries }
    }

    /// Append one entry, persisting it when file-backed. Empty entries
    /// are dropped.
    pub fn append(&mut self, entry: &str) -> io::Result<()> {
        if entry.is_empty() {
            return Ok(());
        }
        self.entries.push(entry.to_string());
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{entry}")?;
        }
        Ok(())
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn in_memory_append_keeps_order() {
        let mut h = History::in_memory();
        h.append(":w").unwrap();
        h.append(":q").unwrap();
        assert_eq!(h.entries(), &[":w".to_string(), ":q".to_string()]);
        assert_eq!(h.last(), Some(":q"));
    }

    #[test]
    fn empty_entries_are_dropped() {
        let mut h = History::in_memory();
        h.append("").unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn file_backed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands_history");

        let mut h = History::load(&path);
        assert!(h.is_empty());
        h.append("wq").unwrap();
        h.append("e foo.txt").unwrap();

        let reloaded = History::load(&path);
        assert_eq!(reloaded.entries(), &["wq".to_string(), "e foo.txt".to_string()]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let h = History::load("/nonexistent/path/history");
        assert!(h.is_empty());
    }
}
