//! A file buffer.
//!
//! `Buffer` owns the current [`Document`] snapshot and everything attached
//! to it: undo/redo stacks of prior snapshots, named marks, per-buffer
//! option overrides, a selection, and the on-disk text used to detect
//! unsaved changes. Every edit goes through the pure `Document`
//! constructors and atomically replaces the current snapshot.

use std::collections::HashMap;
use std::io;

use ved_text::Document;

use crate::register::{PasteMode, RegisterContent, RegisterKind};
use crate::search::{self, SearchError, SearchHit, SearchState};
use crate::storage::Storage;

// ---------------------------------------------------------------------------
// Options and attachments
// ---------------------------------------------------------------------------

/// Per-buffer option overrides. `None` falls back to the editor-wide
/// default.
#[derive(Debug, Default, Clone)]
pub struct BufferOptions {
    pub filetype: Option<String>,
    pub autoindent: Option<bool>,
    pub expand_tab: Option<bool>,
    pub tabstop: Option<usize>,
    pub shiftwidth: Option<usize>,
    pub encoding: Option<String>,
}

/// An active visual selection: the anchor offset plus the selection shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub kind: RegisterKind,
}

/// One finding of the background report pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportError {
    pub row: usize,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Buffer {
    pub location: Option<String>,
    document: Document,
    /// Text as last read from / written to storage.
    text_on_disk: String,
    /// True when the location does not exist in storage yet.
    pub is_new: bool,
    undo_stack: Vec<Document>,
    redo_stack: Vec<Document>,
    /// `m<letter>` marks: 1-based line numbers.
    pub marks: HashMap<char, usize>,
    pub options: BufferOptions,
    pub selection: Option<Selection>,
    /// Prior working texts walked by search wraparound.
    pub history_lines: Vec<String>,
    report_errors: Vec<ReportError>,
    /// Text the current `report_errors` were computed against.
    reported_text: Option<String>,
    reporter_running: bool,
}

impl Buffer {
    /// An empty, unnamed buffer.
    #[must_use]
    pub fn scratch() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self { document: Document::new(text), text_on_disk: text.to_string(), ..Self::default() }
    }

    /// A buffer for `location` with text already read from storage.
    #[must_use]
    pub fn with_location(location: &str, text: &str, is_new: bool) -> Self {
        Self {
            location: Some(location.to_string()),
            document: Document::new(text),
            text_on_disk: text.to_string(),
            is_new,
            ..Self::default()
        }
    }

    // -- document access ----------------------------------------------------

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Replace the current snapshot. Does not touch the undo stack;
    /// callers decide when an edit is an undo point.
    pub fn set_document(&mut self, document: Document) {
        self.document = document;
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.document.text()
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.text_on_disk != self.text()
    }

    /// Name as displayed in listings and the status line.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.location.as_deref().unwrap_or("[New file]")
    }

    // -- undo ---------------------------------------------------------------

    /// Record the current snapshot as an undo point.
    pub fn save_to_undo_stack(&mut self) {
        self.undo_stack.push(self.document.clone());
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(prior) => {
                self.redo_stack.push(std::mem::replace(&mut self.document, prior));
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push(std::mem::replace(&mut self.document, next));
                true
            }
            None => false,
        }
    }

    // -- editing ------------------------------------------------------------

    pub fn insert_text(&mut self, text: &str, overwrite: bool) {
        self.document = self.document.inserting(text, overwrite);
    }

    /// Delete `count` chars after the cursor, returning them.
    pub fn delete(&mut self, count: usize) -> String {
        let (doc, deleted) = self.document.deleting(count);
        self.document = doc;
        deleted
    }

    /// Delete `count` chars before the cursor, returning them.
    pub fn delete_before(&mut self, count: usize) -> String {
        let (doc, deleted) = self.document.deleting_before(count);
        self.document = doc;
        deleted
    }

    /// `J` / `gJ` — join the next line onto this one.
    pub fn join_next_line(&mut self, separator: &str) {
        let row = self.document.cursor_row();
        if row + 1 >= self.document.line_count() {
            return;
        }
        let mut lines = self.document.lines();
        let next = lines.remove(row + 1);
        let current = std::mem::take(&mut lines[row]);
        let joined_at = current.chars().count();
        lines[row] = format!("{current}{separator}{}", next.trim_start());
        let text = lines.join("\n");
        let cursor = self.document.row_col_to_offset(row, 0) + joined_at;
        self.document = Document::with_cursor(&text, cursor);
    }

    /// Apply `transform` to every row in `rows` (0-based, end-exclusive).
    pub fn transform_lines<F>(&mut self, rows: std::ops::Range<usize>, transform: F)
    where
        F: Fn(&str) -> String,
    {
        let mut lines = self.document.lines();
        for row in rows {
            if let Some(line) = lines.get_mut(row) {
                *line = transform(line);
            }
        }
        let text = lines.join("\n");
        let cursor = self.document.cursor().min(text.chars().count());
        self.document = Document::with_cursor(&text, cursor);
    }

    pub fn transform_current_line<F>(&mut self, transform: F)
    where
        F: Fn(&str) -> String,
    {
        let row = self.document.cursor_row();
        self.transform_lines(row..row + 1, transform);
    }

    /// `Enter` in insert mode: break the line, optionally copying the
    /// current line's indentation.
    pub fn newline(&mut self, copy_margin: bool) {
        let margin = if copy_margin { leading_whitespace(&self.document.current_line()) } else { String::new() };
        self.insert_text(&format!("\n{margin}"), false);
    }

    /// `o` — open a line below and move onto it.
    pub fn insert_line_below(&mut self, copy_margin: bool) {
        let margin = if copy_margin { leading_whitespace(&self.document.current_line()) } else { String::new() };
        let at = self.document.cursor() as isize + self.document.end_of_line();
        self.document = self.document.at(at.max(0) as usize).inserting(&format!("\n{margin}"), false);
    }

    /// `O` — open a line above and move onto it.
    pub fn insert_line_above(&mut self, copy_margin: bool) {
        let margin = if copy_margin { leading_whitespace(&self.document.current_line()) } else { String::new() };
        let row = self.document.cursor_row();
        let at = self.document.row_col_to_offset(row, 0);
        let doc = self.document.at(at).inserting(&format!("{margin}\n"), false);
        // Land at the end of the margin on the new line.
        self.document = doc.at(at + margin.chars().count());
    }

    // -- clipboard ----------------------------------------------------------

    /// Paste `content` `count` times, placed by its kind and `mode`.
    pub fn paste(&mut self, content: &RegisterContent, count: usize, mode: PasteMode) {
        if content.is_empty() || count == 0 {
            return;
        }
        match content.kind {
            RegisterKind::Characters => self.paste_characters(content, count, mode),
            RegisterKind::Lines => self.paste_lines(content, count, mode),
            RegisterKind::Block => self.paste_block(content, count, mode),
        }
    }

    fn paste_characters(&mut self, content: &RegisterContent, count: usize, mode: PasteMode) {
        let data = content.text.repeat(count);
        let at = match mode {
            PasteMode::Before => self.document.cursor(),
            PasteMode::After => {
                match self.document.current_char() {
                    Some(c) if c != '\n' => self.document.cursor() + 1,
                    _ => self.document.cursor(),
                }
            }
        };
        let inserted = data.chars().count();
        let doc = self.document.at(at).inserting(&data, false);
        // Vi leaves the cursor on the last pasted character.
        self.document = doc.at(at + inserted.saturating_sub(1));
    }

    fn paste_lines(&mut self, content: &RegisterContent, count: usize, mode: PasteMode) {
        let mut lines = self.document.lines();
        let row = self.document.cursor_row();
        let insert_at = match mode {
            PasteMode::After => row + 1,
            PasteMode::Before => row,
        };
        let pasted: Vec<String> = std::iter::repeat_with(|| content.text.lines())
            .take(count)
            .flatten()
            .map(str::to_string)
            .collect();
        lines.splice(insert_at..insert_at, pasted);
        let text = lines.join("\n");
        // Cursor lands at the start of the first pasted line.
        let cursor = Document::new(&text).row_col_to_offset(insert_at.min(lines.len().saturating_sub(1)), 0);
        self.document = Document::with_cursor(&text, cursor);
    }

    fn paste_block(&mut self, content: &RegisterContent, count: usize, mode: PasteMode) {
        let col = self.document.cursor_col()
            + match mode {
                PasteMode::After => 1,
                PasteMode::Before => 0,
            };
        let row = self.document.cursor_row();
        let mut lines = self.document.lines();
        for (i, fragment) in content.text.lines().enumerate() {
            let Some(line) = lines.get_mut(row + i) else { break };
            let at = line
                .char_indices()
                .nth(col)
                .map_or(line.len(), |(byte, _)| byte);
            line.insert_str(at, &fragment.repeat(count));
        }
        let cursor = self.document.cursor();
        self.document = Document::with_cursor(&lines.join("\n"), cursor);
    }

    // -- search -------------------------------------------------------------

    /// The working lines searched by wraparound: prior history entries,
    /// then the current text (the active entry).
    #[must_use]
    pub fn working_lines(&self) -> Vec<String> {
        let mut lines = self.history_lines.clone();
        lines.push(self.text());
        lines
    }

    pub fn search(
        &self,
        state: &SearchState,
        include_current_position: bool,
        count: usize,
        ignore_case: bool,
        wrapscan: bool,
    ) -> Result<SearchHit, SearchError> {
        let lines = self.working_lines();
        let index = lines.len() - 1;
        search::search(
            &lines,
            index,
            &self.document,
            state,
            include_current_position,
            count,
            ignore_case,
            wrapscan,
        )
    }

    /// Move to a search result, switching the document to a historical
    /// working line when the hit landed in one.
    pub fn apply_search_hit(&mut self, hit: SearchHit) {
        let lines = self.working_lines();
        if hit.working_index + 1 == lines.len() {
            self.document = self.document.at(hit.cursor);
        } else {
            self.document = Document::with_cursor(&lines[hit.working_index], hit.cursor);
        }
    }

    // -- storage ------------------------------------------------------------

    /// Re-read the buffer's location, keeping the cursor clamped.
    pub fn reload(&mut self, storage: &dyn Storage) -> io::Result<()> {
        let Some(location) = self.location.clone() else {
            return Ok(());
        };
        let text = storage.read(&location)?;
        let cursor = self.document.cursor().min(text.chars().count());
        self.document = Document::with_cursor(&text, cursor);
        self.text_on_disk = text;
        Ok(())
    }

    /// Write to storage, optionally to a new location.
    pub fn write(&mut self, storage: &dyn Storage, location: Option<&str>) -> io::Result<()> {
        if let Some(location) = location {
            self.location = Some(location.to_string());
        }
        let Some(location) = self.location.clone() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "no file name"));
        };
        let text = self.text();
        storage.write(&location, &text)?;
        self.text_on_disk = text;
        self.is_new = false;
        Ok(())
    }

    // -- report pass --------------------------------------------------------

    /// Run the background report pass when the text changed since the
    /// last pass. The guard ensures a pass triggered from within a pass
    /// is skipped rather than recursing; the skipped change is picked up
    /// on the next one.
    pub fn run_reporter(&mut self, report: &dyn Fn(&str, &Document) -> Vec<ReportError>) {
        if self.reporter_running || self.location.is_none() {
            return;
        }
        let text = self.text();
        if self.reported_text.as_deref() == Some(text.as_str()) {
            return;
        }
        self.reporter_running = true;
        self.report_errors = report(self.location.as_deref().unwrap_or(""), &self.document);
        self.reported_text = Some(text);
        self.reporter_running = false;
    }

    #[must_use]
    pub fn report_errors(&self) -> &[ReportError] {
        &self.report_errors
    }
}

fn leading_whitespace(line: &str) -> String {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::search::SearchDirection;

    use super::*;

    // -- undo ---------------------------------------------------------------

    #[test]
    fn undo_redo_round_trip() {
        let mut buf = Buffer::from_text("one");
        buf.save_to_undo_stack();
        buf.insert_text(" two", false);
        assert_eq!(buf.text(), " twoone");

        assert!(buf.undo());
        assert_eq!(buf.text(), "one");
        assert!(buf.redo());
        assert_eq!(buf.text(), " twoone");
        assert!(!buf.redo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut buf = Buffer::from_text("a");
        buf.save_to_undo_stack();
        buf.insert_text("b", false);
        buf.undo();
        buf.save_to_undo_stack();
        buf.insert_text("c", false);
        assert!(!buf.redo());
    }

    // -- editing ------------------------------------------------------------

    #[test]
    fn join_next_line_strips_leading_whitespace() {
        let mut buf = Buffer::from_text("foo\n   bar\nbaz");
        buf.join_next_line(" ");
        assert_eq!(buf.text(), "foo bar\nbaz");
        assert_eq!(buf.document().cursor(), 3);
    }

    #[test]
    fn join_without_separator() {
        let mut buf = Buffer::from_text("foo\nbar");
        buf.join_next_line("");
        assert_eq!(buf.text(), "foobar");
    }

    #[test]
    fn join_on_last_line_is_a_no_op() {
        let mut buf = Buffer::from_text("only");
        buf.join_next_line(" ");
        assert_eq!(buf.text(), "only");
    }

    #[test]
    fn transform_lines_applies_to_range_only() {
        let mut buf = Buffer::from_text("a\nb\nc");
        buf.transform_lines(1..2, str::to_uppercase);
        assert_eq!(buf.text(), "a\nB\nc");
    }

    #[test]
    fn newline_copies_margin() {
        let mut buf = Buffer::from_text("  foo");
        buf.set_document(buf.document().at(5));
        buf.newline(true);
        assert_eq!(buf.text(), "  foo\n  ");
    }

    #[test]
    fn open_line_below_and_above() {
        let mut buf = Buffer::from_text("  aa\nbb");
        buf.set_document(buf.document().at(3));
        buf.insert_line_below(true);
        assert_eq!(buf.text(), "  aa\n  \nbb");
        assert_eq!(buf.document().cursor_row(), 1);

        let mut buf = Buffer::from_text("aa");
        buf.insert_line_above(false);
        assert_eq!(buf.text(), "\naa");
        assert_eq!(buf.document().cursor(), 0);
    }

    // -- paste --------------------------------------------------------------

    #[test]
    fn paste_characters_after_cursor() {
        let mut buf = Buffer::from_text("ab");
        buf.paste(&RegisterContent::characters("XY"), 1, PasteMode::After);
        assert_eq!(buf.text(), "aXYb");
        // Cursor rests on the last pasted char.
        assert_eq!(buf.document().cursor(), 2);
    }

    #[test]
    fn paste_characters_with_count() {
        let mut buf = Buffer::from_text("ab");
        buf.paste(&RegisterContent::characters("x"), 3, PasteMode::Before);
        assert_eq!(buf.text(), "xxxab");
    }

    #[test]
    fn paste_lines_below_current() {
        let mut buf = Buffer::from_text("aa\nbb");
        buf.paste(&RegisterContent::lines("new"), 1, PasteMode::After);
        assert_eq!(buf.text(), "aa\nnew\nbb");
        assert_eq!(buf.document().cursor_row(), 1);
    }

    #[test]
    fn paste_lines_above_current() {
        let mut buf = Buffer::from_text("aa\nbb");
        buf.paste(&RegisterContent::lines("x\ny"), 1, PasteMode::Before);
        assert_eq!(buf.text(), "x\ny\naa\nbb");
        assert_eq!(buf.document().cursor_row(), 0);
    }

    // -- search -------------------------------------------------------------

    #[test]
    fn buffer_search_wraps_over_its_own_text() {
        let mut buf = Buffer::from_text("needle stack");
        buf.set_document(buf.document().at(8));
        let state =
            SearchState { text: "needle".to_string(), direction: SearchDirection::Forward };
        let hit = buf.search(&state, false, 1, false, true).unwrap();
        buf.apply_search_hit(hit);
        assert_eq!(buf.document().cursor(), 0);
        assert_eq!(buf.text(), "needle stack");
    }

    #[test]
    fn search_hit_in_history_switches_working_line() {
        let mut buf = Buffer::from_text("current");
        buf.history_lines = vec!["older text".to_string()];
        let state = SearchState { text: "older".to_string(), direction: SearchDirection::Forward };
        let hit = buf.search(&state, false, 1, false, true).unwrap();
        buf.apply_search_hit(hit);
        assert_eq!(buf.text(), "older text");
        assert_eq!(buf.document().cursor(), 0);
    }

    // -- storage ------------------------------------------------------------

    #[test]
    fn unsaved_changes_tracking() {
        let mut buf = Buffer::from_text("clean");
        assert!(!buf.has_unsaved_changes());
        buf.insert_text("x", false);
        assert!(buf.has_unsaved_changes());
    }

    #[test]
    fn write_updates_disk_snapshot() {
        use crate::storage::FileStorage;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        let storage = FileStorage::new();

        let mut buf = Buffer::with_location(path.to_str().unwrap(), "hello", true);
        buf.insert_text("X", false);
        assert!(buf.has_unsaved_changes());
        buf.write(&storage, None).unwrap();
        assert!(!buf.has_unsaved_changes());
        assert!(!buf.is_new);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Xhello\n");
    }

    // -- reporter -----------------------------------------------------------

    #[test]
    fn reporter_skips_unnamed_buffers() {
        let mut buf = Buffer::from_text("text");
        buf.run_reporter(&|_, _| vec![ReportError { row: 0, message: "x".into() }]);
        assert!(buf.report_errors().is_empty());
    }

    #[test]
    fn reporter_stores_findings() {
        let mut buf = Buffer::with_location("a.txt", "text", false);
        buf.run_reporter(&|_, _| vec![ReportError { row: 0, message: "finding".into() }]);
        assert_eq!(buf.report_errors().len(), 1);
    }

    #[test]
    fn reporter_reruns_only_when_text_changes() {
        use std::cell::Cell;

        let runs = Cell::new(0);
        let report = |_: &str, _: &Document| {
            runs.set(runs.get() + 1);
            Vec::new()
        };
        let mut buf = Buffer::with_location("a.txt", "text", false);
        buf.run_reporter(&report);
        buf.run_reporter(&report);
        assert_eq!(runs.get(), 1);
        buf.insert_text("x", false);
        buf.run_reporter(&report);
        assert_eq!(runs.get(), 2);
    }
}
