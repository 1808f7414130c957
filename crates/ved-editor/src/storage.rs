//! Storage backends.
//!
//! Buffers read and write through the [`Storage`] trait so the editor core
//! never touches the filesystem directly; alternative backends (archives,
//! remote files) plug in behind the same contract. Reads normalize
//! `\r\n` to `\n` and strip the single trailing newline (the buffer edits
//! text without it); writes append exactly one trailing newline.

use std::fs;
use std::io;
use std::path::Path;

/// What a location currently refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Missing,
    File,
    Directory,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// The I/O contract buffers consume.
pub trait Storage {
    /// True when this backend is able to handle `location`.
    fn can_open_location(&self, location: &str) -> bool;

    /// Whether the location exists, and as what.
    fn presence(&self, location: &str) -> Presence;

    /// Read the text at `location`, normalized for editing.
    fn read(&self, location: &str) -> io::Result<String>;

    /// Write `text` to `location` with a single trailing newline.
    fn write(&self, location: &str, text: &str) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// The native local-filesystem backend.
#[derive(Debug, Default)]
pub struct FileStorage;

impl FileStorage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FileStorage {
    fn can_open_location(&self, location: &str) -> bool {
        // URLs belong to other backends.
        !location.contains("://")
    }

    fn presence(&self, location: &str) -> Presence {
        let path = Path::new(location);
        if path.is_dir() {
            Presence::Directory
        } else if path.exists() {
            Presence::File
        } else {
            Presence::Missing
        }
    }

    fn read(&self, location: &str) -> io::Result<String> {
        let raw = fs::read_to_string(location)?;
        let mut text = raw.replace("\r\n", "\n");
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    fn write(&self, location: &str, text: &str) -> io::Result<()> {
        let mut data = String::with_capacity(text.len() + 1);
        data.push_str(text);
        data.push('\n');
        fs::write(location, data)
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
    fn read_strips_trailing_newline_and_normalizes_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "one\r\ntwo\n").unwrap();

        let storage = FileStorage::new();
        let text = storage.read(path.to_str().unwrap()).unwrap();
        assert_eq!(text, "one\ntwo");
    }

    #[test]
    fn write_appends_exactly_one_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");

        let storage = FileStorage::new();
        storage.write(path.to_str().unwrap(), "one\ntwo").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn round_trip_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        let loc = path.to_str().unwrap();

        let storage = FileStorage::new();
        storage.write(loc, "alpha\nbeta").unwrap();
        assert_eq!(storage.read(loc).unwrap(), "alpha\nbeta");
        assert_eq!(storage.presence(loc), Presence::File);
    }

    #[test]
    fn presence_distinguishes_dirs_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new();
        assert_eq!(storage.presence(dir.path().to_str().unwrap()), Presence::Directory);
        assert_eq!(storage.presence("/no/such/file"), Presence::Missing);
    }

    #[test]
    fn urls_are_not_local_files() {
        let storage = FileStorage::new();
        assert!(!storage.can_open_location("http://example.com/x"));
        assert!(storage.can_open_location("plain.txt"));
    }
}
