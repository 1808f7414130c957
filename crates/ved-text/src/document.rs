//! Immutable text document snapshots.
//!
//! A [`Document`] is a value: a piece of text plus a cursor offset into it.
//! Every edit produces a *new* `Document` — nothing is ever mutated in
//! place. The owning buffer replaces its current snapshot atomically, which
//! makes undo a matter of keeping old snapshots around.
//!
//! # Design choices
//!
//! - **ropey** backs the text. Rope clones are O(1), so the
//!   snapshot-per-edit lifecycle costs nothing even for large files.
//!
//! - **Offsets count chars**, not bytes. The cursor is a char offset with
//!   the invariant `0 <= cursor <= len_chars`. Byte offsets never leak into
//!   the public API.
//!
//! - **Boundary queries return *relative* offsets** (`isize`, added to the
//!   cursor), because that is the currency of text objects: an operator
//!   receives "start/end relative to the cursor" and the buffer applies it.
//!
//! - A document with no text still has exactly one (empty) line.

use std::fmt;

use ropey::Rope;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An immutable snapshot of text plus a cursor offset.
///
/// Cheap to clone (rope clones are O(1)). All position arithmetic is a pure
/// function of the snapshot; the edit constructors ([`inserting`],
/// [`deleting`], …) return a new snapshot and leave `self` untouched.
///
/// [`inserting`]: Document::inserting
/// [`deleting`]: Document::deleting
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    rope: Rope,
    /// Char offset of the cursor. Invariant: `0 <= cursor <= len_chars()`.
    cursor: usize,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// Create a document from text with the cursor at offset 0.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: 0,
        }
    }

    /// Create a document with an explicit cursor offset.
    ///
    /// The offset is clamped into `0..=len_chars`.
    #[must_use]
    pub fn with_cursor(text: &str, cursor: usize) -> Self {
        let rope = Rope::from_str(text);
        let cursor = cursor.min(rope.len_chars());
        Self { rope, cursor }
    }

    /// Create a document from an existing rope (no text copy).
    #[must_use]
    pub fn from_rope(rope: Rope, cursor: usize) -> Self {
        let cursor = cursor.min(rope.len_chars());
        Self { rope, cursor }
    }

    /// A copy of this document with the cursor moved to `cursor` (clamped).
    #[must_use]
    pub fn at(&self, cursor: usize) -> Self {
        Self {
            rope: self.rope.clone(),
            cursor: cursor.min(self.rope.len_chars()),
        }
    }

    /// A copy with the cursor moved by a relative offset (saturating,
    /// clamped to the text length).
    #[must_use]
    pub fn moved(&self, delta: isize) -> Self {
        let cursor = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor + delta.unsigned_abs()
        };
        self.at(cursor)
    }

    // -- Basic accessors ----------------------------------------------------

    /// The cursor offset (chars).
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Total length in chars.
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// True when the document contains no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// The whole text, materialized.
    #[must_use]
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of lines. An empty document has one (empty) line; a trailing
    /// newline opens a final empty line, matching `text.split('\n')`.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    // -- Row/column translation ---------------------------------------------

    /// The 0-indexed row the cursor is on.
    #[must_use]
    pub fn cursor_row(&self) -> usize {
        self.rope.char_to_line(self.cursor)
    }

    /// The 0-indexed column of the cursor (chars from the line start).
    #[must_use]
    pub fn cursor_col(&self) -> usize {
        self.cursor - self.rope.line_to_char(self.cursor_row())
    }

    /// Translate a `(row, col)` pair to an absolute char offset.
    ///
    /// `row` is clamped to the last line; `col` is clamped to the line's
    /// content length (the position after the last visible char).
    #[must_use]
    pub fn row_col_to_offset(&self, row: usize, col: usize) -> usize {
        let row = row.min(self.line_count().saturating_sub(1));
        let line_start = self.rope.line_to_char(row);
        line_start + col.min(self.line_content_len(row))
    }

    /// Translate an absolute char offset to a `(row, col)` pair.
    /// The offset is clamped to the text length.
    #[must_use]
    pub fn offset_to_row_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len_chars());
        let row = self.rope.char_to_line(offset);
        (row, offset - self.rope.line_to_char(row))
    }

    // -- Line access --------------------------------------------------------

    /// Line `row` without its trailing newline. `None` when out of range.
    #[must_use]
    pub fn line(&self, row: usize) -> Option<String> {
        if row >= self.line_count() {
            return None;
        }
        let s: String = self.rope.line(row).chars().collect();
        Some(s.trim_end_matches(['\n', '\r']).to_string())
    }

    /// All lines, newline-free. Equivalent to `text.split('\n')`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .map(|row| self.line(row).unwrap_or_default())
            .collect()
    }

    /// Content length (chars, excluding line ending) of line `row`.
    /// Returns 0 when out of range.
    #[must_use]
    pub fn line_content_len(&self, row: usize) -> usize {
        self.line(row).map_or(0, |l| l.chars().count())
    }

    /// The line the cursor is on, newline-free.
    #[must_use]
    pub fn current_line(&self) -> String {
        self.line(self.cursor_row()).unwrap_or_default()
    }

    /// The part of the current line before the cursor.
    #[must_use]
    pub fn current_line_before_cursor(&self) -> String {
        let col = self.cursor_col();
        self.current_line().chars().take(col).collect()
    }

    /// The part of the current line at and after the cursor.
    #[must_use]
    pub fn current_line_after_cursor(&self) -> String {
        let col = self.cursor_col();
        self.current_line().chars().skip(col).collect()
    }

    /// All text strictly before the cursor.
    #[must_use]
    pub fn text_before_cursor(&self) -> String {
        self.rope.slice(..self.cursor).to_string()
    }

    /// All text at and after the cursor.
    #[must_use]
    pub fn text_after_cursor(&self) -> String {
        self.rope.slice(self.cursor..).to_string()
    }

    // -- Char access --------------------------------------------------------

    /// The char under the cursor, or `None` at end-of-text.
    #[must_use]
    pub fn current_char(&self) -> Option<char> {
        self.char_at(self.cursor)
    }

    /// The char at an absolute offset, or `None` past the end.
    #[must_use]
    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.len_chars()).then(|| self.rope.char(offset))
    }

    /// The char at a cursor-relative offset.
    #[must_use]
    pub fn char_relative(&self, offset: isize) -> Option<char> {
        let idx = self.cursor.checked_add_signed(offset)?;
        self.char_at(idx)
    }

    // -- Boundary queries (cursor-relative offsets) -------------------------

    /// Relative offset to the start of the current line.
    ///
    /// With `after_whitespace`, lands on the first non-blank char instead
    /// (or the line end for an all-blank line).
    #[must_use]
    pub fn start_of_line(&self, after_whitespace: bool) -> isize {
        let col = self.cursor_col();
        if after_whitespace {
            let line = self.current_line();
            let indent = line.chars().take_while(|c| c.is_whitespace()).count();
            indent as isize - col as isize
        } else {
            -(col as isize)
        }
    }

    /// Relative offset to the end of the current line (the position after
    /// the last visible char, before the newline).
    #[must_use]
    pub fn end_of_line(&self) -> isize {
        let row = self.cursor_row();
        let line_end = self.rope.line_to_char(row) + self.line_content_len(row);
        line_end as isize - self.cursor as isize
    }

    /// Relative offset to the very start of the document.
    #[must_use]
    pub const fn start_of_document(&self) -> isize {
        -(self.cursor as isize)
    }

    /// Relative offset to the very end of the document.
    #[must_use]
    pub fn end_of_document(&self) -> isize {
        self.len_chars() as isize - self.cursor as isize
    }

    /// Relative offset for moving left within the current line:
    /// `-min(count, col)`.
    #[must_use]
    pub fn cursor_left(&self, count: usize) -> isize {
        -(count.min(self.cursor_col()) as isize)
    }

    /// Relative offset for moving right within the current line. The cursor
    /// never passes the last visible char (Vi navigation semantics).
    #[must_use]
    pub fn cursor_right(&self, count: usize) -> isize {
        let after = self.current_line_after_cursor().chars().count();
        count.min(after.saturating_sub(1)) as isize
    }

    // -- Edit constructors (pure) -------------------------------------------

    /// Insert `text` at the cursor; the cursor ends up after the insertion.
    ///
    /// With `overwrite`, up to `text.chars().count()` chars of the current
    /// line (never past its end) are consumed first — Vi replace-mode
    /// typing.
    #[must_use]
    pub fn inserting(&self, text: &str, overwrite: bool) -> Self {
        let mut rope = self.rope.clone();
        if overwrite {
            let overwritten = text
                .chars()
                .count()
                .min(self.current_line_after_cursor().chars().count());
            rope.remove(self.cursor..self.cursor + overwritten);
        }
        rope.insert(self.cursor, text);
        let cursor = self.cursor + text.chars().count();
        Self { rope, cursor }
    }

    /// Delete up to `count` chars at/after the cursor. Returns the new
    /// document and the removed text.
    #[must_use]
    pub fn deleting(&self, count: usize) -> (Self, String) {
        let end = (self.cursor + count).min(self.len_chars());
        let removed = self.rope.slice(self.cursor..end).to_string();
        let mut rope = self.rope.clone();
        rope.remove(self.cursor..end);
        (
            Self {
                rope,
                cursor: self.cursor,
            },
            removed,
        )
    }

    /// Delete up to `count` chars before the cursor. Returns the new
    /// document and the removed text.
    #[must_use]
    pub fn deleting_before(&self, count: usize) -> (Self, String) {
        let start = self.cursor.saturating_sub(count);
        let removed = self.rope.slice(start..self.cursor).to_string();
        let mut rope = self.rope.clone();
        rope.remove(start..self.cursor);
        (Self { rope, cursor: start }, removed)
    }

    /// Remove the char span `[start, end)` (absolute offsets, clamped).
    /// Returns the new document (cursor at `start`) and the removed text.
    #[must_use]
    pub fn removing_span(&self, start: usize, end: usize) -> (Self, String) {
        let len = self.len_chars();
        let start = start.min(len);
        let end = end.clamp(start, len);
        let removed = self.rope.slice(start..end).to_string();
        let mut rope = self.rope.clone();
        rope.remove(start..end);
        (Self { rope, cursor: start }, removed)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document({} chars, cursor {})", self.len_chars(), self.cursor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_starts_at_zero() {
        let doc = Document::new("hello");
        assert_eq!(doc.cursor(), 0);
        assert_eq!(doc.len_chars(), 5);
        assert!(!doc.is_empty());
    }

    #[test]
    fn with_cursor_clamps() {
        let doc = Document::with_cursor("abc", 99);
        assert_eq!(doc.cursor(), 3);
    }

    #[test]
    fn empty_document_has_one_line() {
        let doc = Document::new("");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.lines(), vec![String::new()]);
        assert!(doc.is_empty());
    }

    #[test]
    fn at_and_moved() {
        let doc = Document::new("hello");
        assert_eq!(doc.at(3).cursor(), 3);
        assert_eq!(doc.at(3).moved(-2).cursor(), 1);
        assert_eq!(doc.at(3).moved(100).cursor(), 5);
        assert_eq!(doc.moved(-10).cursor(), 0);
    }

    // -- Row/column translation ---------------------------------------------

    #[test]
    fn cursor_row_col() {
        let doc = Document::with_cursor("foo\nbar\nbaz", 5);
        assert_eq!(doc.cursor_row(), 1);
        assert_eq!(doc.cursor_col(), 1);
    }

    #[test]
    fn row_col_to_offset_round_trip() {
        let doc = Document::new("foo\nbar\nbaz");
        for offset in 0..=doc.len_chars() {
            let (row, col) = doc.offset_to_row_col(offset);
            // Offsets pointing at a newline clamp onto the line content end.
            let back = doc.row_col_to_offset(row, col);
            assert!(back <= offset);
            assert_eq!(doc.offset_to_row_col(back).0, row);
        }
    }

    #[test]
    fn row_col_to_offset_clamps() {
        let doc = Document::new("ab\ncd");
        assert_eq!(doc.row_col_to_offset(99, 0), 3);
        assert_eq!(doc.row_col_to_offset(0, 99), 2);
    }

    #[test]
    fn unicode_offsets_are_chars() {
        let doc = Document::with_cursor("café\nx", 4);
        assert_eq!(doc.cursor_row(), 0);
        assert_eq!(doc.cursor_col(), 4);
        assert_eq!(doc.row_col_to_offset(1, 0), 5);
    }

    // -- Line access --------------------------------------------------------

    #[test]
    fn lines_strip_newlines() {
        let doc = Document::new("foo\nbar\nbaz");
        assert_eq!(doc.lines(), vec!["foo", "bar", "baz"]);
        assert_eq!(doc.line(1).unwrap(), "bar");
        assert!(doc.line(3).is_none());
    }

    #[test]
    fn trailing_newline_opens_empty_line() {
        let doc = Document::new("foo\n");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.lines(), vec!["foo", ""]);
    }

    #[test]
    fn current_line_parts() {
        let doc = Document::with_cursor("hello world", 5);
        assert_eq!(doc.current_line_before_cursor(), "hello");
        assert_eq!(doc.current_line_after_cursor(), " world");
        assert_eq!(doc.current_line(), "hello world");
    }

    #[test]
    fn text_around_cursor() {
        let doc = Document::with_cursor("foo\nbar", 4);
        assert_eq!(doc.text_before_cursor(), "foo\n");
        assert_eq!(doc.text_after_cursor(), "bar");
    }

    // -- Char access --------------------------------------------------------

    #[test]
    fn current_char_at_end_is_none() {
        let doc = Document::with_cursor("ab", 2);
        assert_eq!(doc.current_char(), None);
    }

    #[test]
    fn current_char() {
        let doc = Document::with_cursor("ab", 1);
        assert_eq!(doc.current_char(), Some('b'));
    }

    #[test]
    fn char_relative() {
        let doc = Document::with_cursor("abc", 1);
        assert_eq!(doc.char_relative(-1), Some('a'));
        assert_eq!(doc.char_relative(0), Some('b'));
        assert_eq!(doc.char_relative(1), Some('c'));
        assert_eq!(doc.char_relative(2), None);
        assert_eq!(doc.char_relative(-2), None);
    }

    // -- Boundary queries ---------------------------------------------------

    #[test]
    fn start_of_line_plain() {
        let doc = Document::with_cursor("  indented", 6);
        assert_eq!(doc.start_of_line(false), -6);
        assert_eq!(doc.start_of_line(true), -4); // first non-blank at col 2
    }

    #[test]
    fn start_of_line_before_indent() {
        let doc = Document::with_cursor("  indented", 1);
        assert_eq!(doc.start_of_line(true), 1);
    }

    #[test]
    fn end_of_line_stops_before_newline() {
        let doc = Document::with_cursor("foo\nbar", 1);
        assert_eq!(doc.end_of_line(), 2);
    }

    #[test]
    fn document_boundaries() {
        let doc = Document::with_cursor("abcde", 2);
        assert_eq!(doc.start_of_document(), -2);
        assert_eq!(doc.end_of_document(), 3);
    }

    #[test]
    fn boundary_consistency() {
        // start-of-line then end-of-line reaches at least the original
        // offset, for every offset on a line's content.
        let doc = Document::new("foo\nlonger line\n\nx");
        for offset in 0..=doc.len_chars() {
            let d = doc.at(offset);
            let sol = d.moved(d.start_of_line(false));
            let eol = sol.moved(sol.end_of_line());
            if d.current_char() != Some('\n') {
                assert!(eol.cursor() >= offset, "offset {offset}");
            }
        }
    }

    #[test]
    fn cursor_left_right() {
        let doc = Document::with_cursor("abc\ndef", 5);
        assert_eq!(doc.cursor_left(1), -1);
        assert_eq!(doc.cursor_left(9), -1);
        assert_eq!(doc.cursor_right(1), 1);
        assert_eq!(doc.cursor_right(9), 1); // stays on last char
    }

    #[test]
    fn cursor_right_on_last_char_is_zero() {
        let doc = Document::with_cursor("abc", 2);
        assert_eq!(doc.cursor_right(1), 0);
    }

    // -- Edits --------------------------------------------------------------

    #[test]
    fn inserting_plain() {
        let doc = Document::with_cursor("hello", 5);
        let doc = doc.inserting(" world", false);
        assert_eq!(doc.text(), "hello world");
        assert_eq!(doc.cursor(), 11);
    }

    #[test]
    fn inserting_overwrite() {
        let doc = Document::with_cursor("hello", 0);
        let doc = doc.inserting("J", true);
        assert_eq!(doc.text(), "Jello");
        assert_eq!(doc.cursor(), 1);
    }

    #[test]
    fn inserting_overwrite_stops_at_line_end() {
        let doc = Document::with_cursor("ab\ncd", 1);
        let doc = doc.inserting("XYZ", true);
        // Only 'b' is on the line after the cursor; the newline survives.
        assert_eq!(doc.text(), "aXYZ\ncd");
    }

    #[test]
    fn deleting_returns_removed_text() {
        let doc = Document::with_cursor("hello", 1);
        let (doc, removed) = doc.deleting(3);
        assert_eq!(removed, "ell");
        assert_eq!(doc.text(), "ho");
        assert_eq!(doc.cursor(), 1);
    }

    #[test]
    fn deleting_clamps_at_end() {
        let doc = Document::with_cursor("hi", 1);
        let (doc, removed) = doc.deleting(10);
        assert_eq!(removed, "i");
        assert_eq!(doc.text(), "h");
    }

    #[test]
    fn deleting_before() {
        let doc = Document::with_cursor("hello", 4);
        let (doc, removed) = doc.deleting_before(2);
        assert_eq!(removed, "ll");
        assert_eq!(doc.text(), "heo");
        assert_eq!(doc.cursor(), 2);
    }

    #[test]
    fn removing_span() {
        let doc = Document::with_cursor("foo bar baz", 0);
        let (doc, removed) = doc.removing_span(4, 8);
        assert_eq!(removed, "bar ");
        assert_eq!(doc.text(), "foo baz");
        assert_eq!(doc.cursor(), 4);
    }

    #[test]
    fn edits_do_not_mutate_original() {
        let doc = Document::with_cursor("hello", 0);
        let _ = doc.inserting("x", false);
        let _ = doc.deleting(2);
        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.cursor(), 0);
    }
}
