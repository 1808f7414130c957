//! Text objects and the motions that produce them.
//!
//! A [`TextObject`] is a span relative to the cursor. Used bare, it moves
//! the cursor by `start`; consumed by an operator, it resolves to an
//! absolute range via [`TextObject::operator_range`] and can be cut out of
//! a document. Motions that cannot resolve (`fx` with no `x` ahead, `w`
//! at end of buffer) return `None` and the pending operator aborts.

use ved_text::{word, Document};

use crate::register::{RegisterContent, RegisterKind};

// ---------------------------------------------------------------------------
// TextObject
// ---------------------------------------------------------------------------

/// How the span's end is interpreted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TextObjectKind {
    /// The end position itself is not part of the span.
    #[default]
    Exclusive,
    /// The end position is included (`fx`, `e`).
    Inclusive,
    /// The span covers whole lines.
    Linewise,
}

/// A span relative to the cursor, `start` and `end` both cursor-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextObject {
    pub start: isize,
    pub end: isize,
    pub kind: TextObjectKind,
}

impl TextObject {
    /// A motion to `start` with the default exclusive kind.
    #[must_use]
    pub const fn new(start: isize) -> Self {
        Self { start, end: 0, kind: TextObjectKind::Exclusive }
    }

    #[must_use]
    pub const fn inclusive(start: isize) -> Self {
        Self { start, end: 0, kind: TextObjectKind::Inclusive }
    }

    #[must_use]
    pub const fn linewise(start: isize) -> Self {
        Self { start, end: 0, kind: TextObjectKind::Linewise }
    }

    /// `(low, high)` of the raw span.
    #[must_use]
    pub const fn sorted(&self) -> (isize, isize) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    /// Resolve to cursor-relative `[start, end)` offsets for an operator.
    ///
    /// Exclusive spans ending on a first column back up one position so a
    /// forward motion onto the next line does not eat its newline;
    /// inclusive spans extend by one; linewise spans widen to full lines.
    #[must_use]
    pub fn operator_range(&self, doc: &Document) -> (isize, isize) {
        let (mut start, mut end) = self.sorted();
        let cursor = doc.cursor() as isize;

        match self.kind {
            TextObjectKind::Exclusive => {
                let abs_end = clamp_offset(doc, cursor + end);
                if doc.offset_to_row_col(abs_end).1 == 0 {
                    end -= 1;
                }
            }
            TextObjectKind::Inclusive => end += 1,
            TextObjectKind::Linewise => {
                let (start_row, _) = doc.offset_to_row_col(clamp_offset(doc, cursor + start));
                let (end_row, _) = doc.offset_to_row_col(clamp_offset(doc, cursor + end));
                start = doc.row_col_to_offset(start_row, 0) as isize - cursor;
                end = (doc.row_col_to_offset(end_row, 0) + doc.line_content_len(end_row)) as isize
                    - cursor;
            }
        }
        (start, end)
    }

    /// Remove the span from `doc`, returning the new document and the
    /// removed text tagged with its paste shape.
    #[must_use]
    pub fn cut(&self, doc: &Document) -> (Document, RegisterContent) {
        let (start_rel, end_rel) = self.operator_range(doc);
        let cursor = doc.cursor() as isize;
        let start = clamp_offset(doc, cursor + start_rel);
        let end = clamp_offset(doc, cursor + end_rel);

        if self.kind == TextObjectKind::Linewise {
            let deleted: String = doc.rope().slice(start..end).to_string();
            // Take one adjacent newline with the lines themselves.
            let (span_start, span_end) = if end < doc.len_chars() {
                (start, end + 1)
            } else if start > 0 {
                (start - 1, end)
            } else {
                (start, end)
            };
            let (new_doc, _) = doc.removing_span(span_start, span_end);
            let target = new_doc.cursor().min(new_doc.len_chars());
            (new_doc.at(target), RegisterContent { text: deleted, kind: RegisterKind::Lines })
        } else {
            let (new_doc, deleted) = doc.removing_span(start, end);
            (new_doc, RegisterContent { text: deleted, kind: RegisterKind::Characters })
        }
    }
}

fn clamp_offset(doc: &Document, offset: isize) -> usize {
    let len = doc.len_chars() as isize;
    offset.clamp(0, len) as usize
}

// ---------------------------------------------------------------------------
// Word motions
// ---------------------------------------------------------------------------

/// `w` as an operator target (`dw`, `cw`).
///
/// From whitespace, stops at the next word beginning, never past the end
/// of the line. From a word, covers to the end of that word; with
/// `for_delete` the trailing blanks (but never the newline) go too.
#[must_use]
pub fn word_forward(doc: &Document, count: usize, for_delete: bool) -> Option<TextObject> {
    let current = doc.current_char()?;
    if current == '\n' {
        return None;
    }

    let mut end = if current.is_whitespace() {
        let mut end =
            word::find_next_word_beginning(doc, count).unwrap_or_else(|| doc.end_of_document());
        let after = doc.text_after_cursor();
        if let Some(eol) = after
            .chars()
            .take(end.max(0) as usize)
            .position(|c| c == '\n')
        {
            end = eol as isize;
        }
        end
    } else {
        match word::find_next_word_ending(doc, true, count) {
            Some(e) if e != 0 => e,
            _ => doc.end_of_line(),
        }
    };

    if for_delete {
        while doc
            .char_relative(end)
            .is_some_and(|c| c != '\n' && c.is_whitespace())
        {
            end += 1;
        }
    }

    Some(TextObject::new(end))
}

/// `b` — previous word beginning. Resolves to a zero-length motion when
/// there is none, matching the move-nowhere behavior of `b` at the top.
#[must_use]
pub fn word_backward(doc: &Document, count: usize) -> TextObject {
    TextObject::new(word::find_previous_word_beginning(doc, count).unwrap_or(0))
}

/// `e` — next word ending, inclusive.
#[must_use]
pub fn word_end(doc: &Document, count: usize) -> Option<TextObject> {
    word::find_next_word_ending(doc, false, count).map(|end| TextObject::inclusive(end - 1))
}

/// `iw` — the word (or whitespace run) under the cursor.
#[must_use]
pub fn inner_word(doc: &Document) -> TextObject {
    let (start, end) = word::current_word_bounds(doc, false);
    TextObject { start, end, kind: TextObjectKind::Exclusive }
}

/// `aw` — the word under the cursor plus its trailing blanks.
#[must_use]
pub fn a_word(doc: &Document) -> TextObject {
    let (start, end) = word::current_word_bounds(doc, true);
    TextObject { start, end, kind: TextObjectKind::Exclusive }
}

// ---------------------------------------------------------------------------
// Character finds
// ---------------------------------------------------------------------------

/// The `count`-th occurrence of `c` after the cursor on the current line,
/// cursor-relative. The char under the cursor does not count.
fn find_in_line(doc: &Document, c: char, count: usize) -> Option<isize> {
    doc.current_line_after_cursor()
        .chars()
        .enumerate()
        .skip(1)
        .filter(|&(_, ch)| ch == c)
        .nth(count.saturating_sub(1))
        .map(|(i, _)| i as isize)
}

/// The `count`-th occurrence of `c` before the cursor on the current line.
fn find_in_line_backwards(doc: &Document, c: char, count: usize) -> Option<isize> {
    doc.current_line_before_cursor()
        .chars()
        .rev()
        .enumerate()
        .filter(|&(_, ch)| ch == c)
        .nth(count.saturating_sub(1))
        .map(|(i, _)| -(i as isize) - 1)
}

/// `fx` — onto the next occurrence of `x`, inclusive.
#[must_use]
pub fn find_char(doc: &Document, c: char, count: usize) -> Option<TextObject> {
    find_in_line(doc, c, count).map(TextObject::inclusive)
}

/// `Fx` — back onto the previous occurrence of `x`.
#[must_use]
pub fn find_char_backwards(doc: &Document, c: char, count: usize) -> Option<TextObject> {
    find_in_line_backwards(doc, c, count).map(TextObject::new)
}

/// `tx` — up to (not onto) the next occurrence of `x`.
#[must_use]
pub fn till_char(doc: &Document, c: char, count: usize) -> Option<TextObject> {
    find_in_line(doc, c, count).map(|rel| TextObject::inclusive(rel - 1))
}

/// `Tx` — back to just after the previous occurrence of `x`.
#[must_use]
pub fn till_char_backwards(doc: &Document, c: char, count: usize) -> Option<TextObject> {
    find_in_line_backwards(doc, c, count).map(|rel| TextObject::new(rel + 1))
}

// ---------------------------------------------------------------------------
// Line motions
// ---------------------------------------------------------------------------

/// `$` — end of line.
#[must_use]
pub fn end_of_line(doc: &Document) -> TextObject {
    TextObject::new(doc.end_of_line())
}

/// `0` / `^` — start of line, optionally after leading whitespace.
#[must_use]
pub fn start_of_line(doc: &Document, after_whitespace: bool) -> TextObject {
    TextObject::new(doc.start_of_line(after_whitespace))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
