//! Word-boundary arithmetic.
//!
//! A *word* is a run of `\w` chars (letters, digits, underscore) — the
//! definition the search/motion layer shares with the regex engine. All
//! functions take a [`Document`] and return offsets **relative to the
//! cursor** (`isize`), or `None` when no such boundary exists in the
//! searched direction.
//!
//! | Function | Vi motion it backs |
//! |----------|--------------------|
//! | [`find_next_word_beginning`] | `w` |
//! | [`find_next_word_ending`] | `e`, `cw`/`dw` spans |
//! | [`find_previous_word_beginning`] | `b` |
//! | [`current_word_bounds`] | `iw` / `aw` |

use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;

// One \w+ run. Compiled once, shared by every query.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("static word regex"));

// At the cursor: either a word run or a whitespace run.
static CURRENT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+|\s+)").expect("static current-word regex"));

// At the cursor: a word run plus its trailing whitespace.
static CURRENT_WORD_TRAILING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((\w+)\s*)").expect("static trailing-word regex"));

// ---------------------------------------------------------------------------
// Forward motions
// ---------------------------------------------------------------------------

/// Relative offset of the `count`-th next word *beginning* after the cursor.
///
/// A word starting exactly at the cursor does not count — the motion always
/// advances. Returns `None` when fewer than `count` beginnings remain.
#[must_use]
pub fn find_next_word_beginning(doc: &Document, count: usize) -> Option<isize> {
    let after = doc.text_after_cursor();
    let mut seen = 0;
    for m in WORD_RE.find_iter(&after) {
        let start = char_offset(&after, m.start());
        if start == 0 {
            continue;
        }
        seen += 1;
        if seen == count {
            return Some(start as isize);
        }
    }
    None
}

/// Relative offset of the `count`-th next word *ending*.
///
/// With `include_current_position`, a word ending at/after the cursor's own
/// char counts and the returned offset points *at* the last word char's
/// following position; without it, the search starts one past the cursor
/// and the offset lands *on* the last word char (Vi's `e`).
#[must_use]
pub fn find_next_word_ending(
    doc: &Document,
    include_current_position: bool,
    count: usize,
) -> Option<isize> {
    let after = doc.text_after_cursor();
    let text: String = if include_current_position {
        after
    } else {
        after.chars().skip(1).collect()
    };

    let m = WORD_RE.find_iter(&text).nth(count.saturating_sub(1))?;
    let end = char_offset(&text, m.end()) as isize;
    if include_current_position {
        Some(end)
    } else {
        Some(end + 1)
    }
}

// ---------------------------------------------------------------------------
// Backward motions
// ---------------------------------------------------------------------------

/// Relative (negative) offset of the `count`-th previous word beginning.
///
/// Returns `None` when fewer than `count` word beginnings precede the
/// cursor.
#[must_use]
pub fn find_previous_word_beginning(doc: &Document, count: usize) -> Option<isize> {
    let before = doc.text_before_cursor();
    let starts: Vec<usize> = WORD_RE
        .find_iter(&before)
        .map(|m| char_offset(&before, m.start()))
        .collect();
    if starts.len() < count {
        return None;
    }
    let start = starts[starts.len() - count];
    Some(start as isize - before.chars().count() as isize)
}

// ---------------------------------------------------------------------------
// Current word
// ---------------------------------------------------------------------------

/// Boundaries of the run under the cursor as `(start, end)` relative
/// offsets with `start <= 0 <= end`.
///
/// The run is either a word or a whitespace run (whichever the cursor sits
/// in). With `include_trailing_whitespace`, a word run is extended over the
/// blanks that follow it (`aw`). Both bounds stay within the current line.
#[must_use]
pub fn current_word_bounds(doc: &Document, include_trailing_whitespace: bool) -> (isize, isize) {
    let before_rev: String = doc.current_line_before_cursor().chars().rev().collect();
    let after = doc.current_line_after_cursor();

    // When the chars on either side of the cursor fall in different classes
    // (word vs non-word), only the run after the cursor counts.
    let straddles_boundary = match (doc.char_relative(-1), doc.current_char()) {
        (Some(c1), Some(c2)) => is_word_char(c1) != is_word_char(c2),
        _ => false,
    };

    let start = if straddles_boundary {
        0
    } else {
        CURRENT_WORD_RE
            .find(&before_rev)
            .map_or(0, |m| -(char_offset(&before_rev, m.end()) as isize))
    };

    let end_re: &Regex = if include_trailing_whitespace {
        &CURRENT_WORD_TRAILING_RE
    } else {
        &CURRENT_WORD_RE
    };
    let end = end_re
        .find(&after)
        .map_or(0, |m| char_offset(&after, m.end()) as isize);

    (start, end)
}

/// The word under the cursor as text, or `None` when the cursor is on
/// whitespace or past the end of the line.
#[must_use]
pub fn current_word(doc: &Document) -> Option<String> {
    if !doc.current_char().is_some_and(is_word_char) {
        return None;
    }
    let (start, end) = current_word_bounds(doc, false);
    let from = doc.cursor().checked_add_signed(start)?;
    let to = doc.cursor().checked_add_signed(end)?;
    Some(doc.rope().slice(from..to).to_string())
}

/// Convert a byte offset into `s` to a char offset.
fn char_offset(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // -- find_next_word_beginning -------------------------------------------

    #[test]
    fn next_beginning_basic() {
        let doc = Document::with_cursor("foo bar baz", 0);
        assert_eq!(find_next_word_beginning(&doc, 1), Some(4));
        assert_eq!(find_next_word_beginning(&doc, 2), Some(8));
    }

    #[test]
    fn next_beginning_skips_word_at_cursor() {
        // Cursor on 'f' of "foo" — the first *next* beginning is "bar".
        let doc = Document::with_cursor("foo bar", 0);
        assert_eq!(find_next_word_beginning(&doc, 1), Some(4));
    }

    #[test]
    fn next_beginning_mid_word() {
        let doc = Document::with_cursor("foo bar", 1);
        assert_eq!(find_next_word_beginning(&doc, 1), Some(3));
    }

    #[test]
    fn next_beginning_across_lines() {
        let doc = Document::with_cursor("foo\nbar", 0);
        assert_eq!(find_next_word_beginning(&doc, 1), Some(4));
    }

    #[test]
    fn next_beginning_none_at_end() {
        let doc = Document::with_cursor("foo", 1);
        assert_eq!(find_next_word_beginning(&doc, 1), None);
    }

    #[test]
    fn next_beginning_count_exhausted() {
        let doc = Document::with_cursor("a b c", 0);
        assert_eq!(find_next_word_beginning(&doc, 5), None);
    }

    // -- find_next_word_ending ----------------------------------------------

    #[test]
    fn next_ending_include_current() {
        let doc = Document::with_cursor("foo bar", 0);
        // End of "foo": offset just past the last char.
        assert_eq!(find_next_word_ending(&doc, true, 1), Some(3));
        assert_eq!(find_next_word_ending(&doc, true, 2), Some(7));
    }

    #[test]
    fn next_ending_exclusive() {
        let doc = Document::with_cursor("foo bar", 0);
        // One past the last word char; `e` subtracts one to land on it.
        assert_eq!(find_next_word_ending(&doc, false, 1), Some(3));
    }

    #[test]
    fn next_ending_from_word_end() {
        // On the last char of "foo", exclusive search moves to "bar".
        let doc = Document::with_cursor("foo bar", 2);
        assert_eq!(find_next_word_ending(&doc, false, 1), Some(5));
    }

    #[test]
    fn next_ending_none_on_blank_tail() {
        let doc = Document::with_cursor("foo   ", 4);
        assert_eq!(find_next_word_ending(&doc, true, 1), None);
    }

    // -- find_previous_word_beginning ---------------------------------------

    #[test]
    fn previous_beginning_basic() {
        let doc = Document::with_cursor("foo bar baz", 8);
        assert_eq!(find_previous_word_beginning(&doc, 1), Some(-4));
        assert_eq!(find_previous_word_beginning(&doc, 2), Some(-8));
    }

    #[test]
    fn previous_beginning_mid_word() {
        // Cursor inside "bar": previous beginning is "bar"'s own start.
        let doc = Document::with_cursor("foo bar", 5);
        assert_eq!(find_previous_word_beginning(&doc, 1), Some(-1));
    }

    #[test]
    fn previous_beginning_none_at_start() {
        let doc = Document::with_cursor("foo", 0);
        assert_eq!(find_previous_word_beginning(&doc, 1), None);
    }

    #[test]
    fn previous_beginning_across_lines() {
        let doc = Document::with_cursor("foo\nbar", 4);
        assert_eq!(find_previous_word_beginning(&doc, 1), Some(-4));
    }

    // -- current_word_bounds ------------------------------------------------

    #[test]
    fn bounds_mid_word() {
        let doc = Document::with_cursor("foo bar baz", 5);
        assert_eq!(current_word_bounds(&doc, false), (-1, 2));
    }

    #[test]
    fn bounds_with_trailing_whitespace() {
        let doc = Document::with_cursor("foo bar  baz", 4);
        assert_eq!(current_word_bounds(&doc, true), (0, 5));
    }

    #[test]
    fn bounds_on_whitespace() {
        let doc = Document::with_cursor("foo   bar", 4);
        assert_eq!(current_word_bounds(&doc, false), (-1, 2));
    }

    #[test]
    fn bounds_at_line_start() {
        let doc = Document::with_cursor("foo", 0);
        assert_eq!(current_word_bounds(&doc, false), (0, 3));
    }

    #[test]
    fn bounds_stay_on_current_line() {
        let doc = Document::with_cursor("foo\nbar", 1);
        assert_eq!(current_word_bounds(&doc, false), (-1, 2));
    }

    // -- current_word -------------------------------------------------------

    #[test]
    fn current_word_basic() {
        let doc = Document::with_cursor("hello world", 7);
        assert_eq!(current_word(&doc), Some("world".to_string()));
    }

    #[test]
    fn current_word_on_whitespace_is_none() {
        let doc = Document::with_cursor("hello world", 5);
        assert_eq!(current_word(&doc), None);
    }

    #[test]
    fn current_word_at_end_is_none() {
        let doc = Document::with_cursor("hi", 2);
        assert_eq!(current_word(&doc), None);
    }

    #[test]
    fn current_word_unicode() {
        let doc = Document::with_cursor("café latte", 2);
        assert_eq!(current_word(&doc), Some("café".to_string()));
    }
}
