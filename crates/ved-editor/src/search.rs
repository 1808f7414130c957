//! Buffer search.
//!
//! Forward/backward regex search over a buffer's working lines. The query
//! is a regex; `\<` and `\>` are rewritten to word-boundary assertions so
//! they work mid-pattern, and a query that fails to compile degrades to a
//! literal match of itself. When the active document has no match and
//! wrapscan is enabled, the search walks the remaining working lines
//! cyclically (a buffer with a single working line wraps onto itself,
//! which is exactly Vim's top/bottom wrap within one file).
//!
//! All positions are char offsets, consistent with [`Document`].

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use ved_text::Document;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// The current search query and direction, shared by `/`, `?`, `n`, `N`,
/// and `:s` with an omitted pattern.
#[derive(Debug, Default, Clone)]
pub struct SearchState {
    pub text: String,
    pub direction: SearchDirection,
}

/// A successful search: which working line, and the cursor offset in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub working_index: usize,
    pub cursor: usize,
}

/// Search failure, worded by direction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Search hit BOTTOM without match for: {0}")]
    HitBottom(String),
    #[error("Search hit TOP without match for: {0}")]
    HitTop(String),
}

// ---------------------------------------------------------------------------
// Pattern compilation
// ---------------------------------------------------------------------------

/// Rewrite Vim's `\<` / `\>` to the engine's word-boundary assertions.
fn rewrite_word_boundaries(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('<') => out.push_str(r"\b{start}"),
            Some('>') => out.push_str(r"\b{end}"),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Compile a query, falling back to a literal match when it is not a
/// valid regex. `None` only when even the escaped form fails to build.
fn compile_pattern(pattern: &str, ignore_case: bool) -> Option<Regex> {
    let build = |p: &str| {
        RegexBuilder::new(p)
            .case_insensitive(ignore_case)
            .multi_line(true)
            .build()
            .ok()
    };
    build(&rewrite_word_boundaries(pattern)).or_else(|| build(&regex::escape(pattern)))
}

fn char_offset(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

// ---------------------------------------------------------------------------
// Document-level find
// ---------------------------------------------------------------------------

/// Find the `count`-th match of `pattern` after the cursor. Returns the
/// match start relative to the cursor, or `None`.
///
/// The whole text is matched (so `^` anchors at real line starts) and
/// matches before the cursor are filtered out afterwards.
#[must_use]
pub fn document_find(
    doc: &Document,
    pattern: &str,
    include_current_position: bool,
    ignore_case: bool,
    count: usize,
) -> Option<isize> {
    if !include_current_position && doc.text_after_cursor().is_empty() {
        // Otherwise an empty pattern would always match at the cursor.
        return None;
    }
    let threshold = if include_current_position {
        doc.cursor()
    } else {
        doc.cursor() + 1
    };

    let regex = compile_pattern(pattern, ignore_case)?;
    let text = doc.text();
    regex
        .find_iter(&text)
        .map(|m| char_offset(&text, m.start()))
        .filter(|&start| start >= threshold)
        .nth(count.saturating_sub(1))
        .map(|start| start as isize - doc.cursor() as isize)
}

/// Find the `count`-th match of `pattern` before the cursor, scanning the
/// prefix only. Returns the (negative) match start relative to the cursor.
#[must_use]
pub fn document_find_backwards(
    doc: &Document,
    pattern: &str,
    ignore_case: bool,
    count: usize,
) -> Option<isize> {
    let regex = compile_pattern(pattern, ignore_case)?;
    let before = doc.text_before_cursor();
    let starts: Vec<usize> = regex
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
// Working-line search
// ---------------------------------------------------------------------------

/// Execute a search over a buffer's working lines.
///
/// `lines[working_index]` must be the text of `document`. The result names
/// the working line the final match landed in; the caller switches the
/// buffer there when the index differs.
///
/// Each of the `count` iterations starts from the previous hit; if any
/// iteration misses, the whole search fails and the cursor stays put.
pub fn search(
    lines: &[String],
    working_index: usize,
    document: &Document,
    state: &SearchState,
    include_current_position: bool,
    count: usize,
    ignore_case: bool,
    wrapscan: bool,
) -> Result<SearchHit, SearchError> {
    debug_assert!(count > 0, "search count must be at least 1");
    debug_assert!(!lines.is_empty());

    let mut index = working_index;
    let mut doc = document.clone();

    for _ in 0..count {
        (index, doc) = search_once(
            lines,
            index,
            &doc,
            state,
            include_current_position,
            ignore_case,
            wrapscan,
        )?;
    }

    Ok(SearchHit { working_index: index, cursor: doc.cursor() })
}

fn search_once(
    lines: &[String],
    index: usize,
    doc: &Document,
    state: &SearchState,
    include_current_position: bool,
    ignore_case: bool,
    wrapscan: bool,
) -> Result<(usize, Document), SearchError> {
    let text = &state.text;
    match state.direction {
        SearchDirection::Forward => {
            if let Some(rel) = document_find(doc, text, include_current_position, ignore_case, 1)
            {
                return Ok((index, doc.moved(rel)));
            }
            if wrapscan {
                // Walk the remaining lines cyclically, each searched from
                // its start (a fresh line always includes position 0).
                for step in 1..=lines.len() {
                    let i = (index + step) % lines.len();
                    let line_doc = Document::new(&lines[i]);
                    if let Some(rel) = document_find(&line_doc, text, true, ignore_case, 1) {
                        return Ok((i, line_doc.moved(rel)));
                    }
                }
            }
            Err(SearchError::HitBottom(text.clone()))
        }
        SearchDirection::Backward => {
            if let Some(rel) = document_find_backwards(doc, text, ignore_case, 1) {
                return Ok((index, doc.moved(rel)));
            }
            if wrapscan {
                for step in 1..=lines.len() {
                    let i = (index + lines.len() - (step % lines.len())) % lines.len();
                    let len = lines[i].chars().count();
                    let line_doc = Document::with_cursor(&lines[i], len);
                    if let Some(rel) = document_find_backwards(&line_doc, text, ignore_case, 1) {
                        return Ok((i, line_doc.moved(rel)));
                    }
                }
            }
            Err(SearchError::HitTop(text.clone()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn forward(text: &str) -> SearchState {
        SearchState { text: text.to_string(), direction: SearchDirection::Forward }
    }

    fn backward(text: &str) -> SearchState {
        SearchState { text: text.to_string(), direction: SearchDirection::Backward }
    }

    // -- document_find ------------------------------------------------------

    #[test]
    fn find_after_cursor() {
        let doc = Document::with_cursor("foo bar foo", 0);
        // Matches at the cursor are excluded without include_current_position.
        assert_eq!(document_find(&doc, "foo", false, false, 1), Some(8));
        assert_eq!(document_find(&doc, "foo", true, false, 1), Some(0));
    }

    #[test]
    fn find_counts_occurrences() {
        let doc = Document::with_cursor("a b a b a", 0);
        assert_eq!(document_find(&doc, "a", false, false, 1), Some(4));
        assert_eq!(document_find(&doc, "a", false, false, 2), Some(8));
        assert_eq!(document_find(&doc, "a", false, false, 3), None);
    }

    #[test]
    fn find_anchors_still_work_mid_document() {
        let doc = Document::with_cursor("foo\nbar\nfoo", 2);
        // ^foo must match the real line start, not the cursor position.
        assert_eq!(document_find(&doc, "^foo", false, false, 1), Some(6));
    }

    #[test]
    fn find_at_end_of_text_is_none() {
        let doc = Document::with_cursor("abc", 3);
        assert_eq!(document_find(&doc, "a", false, false, 1), None);
    }

    #[test]
    fn find_ignore_case() {
        let doc = Document::with_cursor("Foo foo", 0);
        assert_eq!(document_find(&doc, "FOO", false, true, 1), Some(4));
        assert_eq!(document_find(&doc, "FOO", false, false, 1), None);
    }

    #[test]
    fn malformed_pattern_falls_back_to_literal() {
        let doc = Document::with_cursor("say a(b now", 0);
        assert_eq!(document_find(&doc, "a(b", false, false, 1), Some(4));
    }

    #[test]
    fn word_boundary_escapes_are_rewritten() {
        let doc = Document::with_cursor("scattered cat", 0);
        assert_eq!(document_find(&doc, r"\<cat\>", false, false, 1), Some(10));
    }

    #[test]
    fn find_backwards_basic() {
        // Only the prefix before the cursor is scanned, so the second
        // "foo" (cut off at the cursor) does not count.
        let doc = Document::with_cursor("foo bar foo", 10);
        assert_eq!(document_find_backwards(&doc, "foo", false, 1), Some(-10));
        assert_eq!(document_find_backwards(&doc, "bar", false, 1), Some(-6));
        assert_eq!(document_find_backwards(&doc, "quux", false, 1), None);
    }

    #[test]
    fn find_backwards_count() {
        let doc = Document::with_cursor("a b a b a", 9);
        assert_eq!(document_find_backwards(&doc, "a", false, 1), Some(-1));
        assert_eq!(document_find_backwards(&doc, "a", false, 2), Some(-5));
    }

    // -- search over working lines ------------------------------------------

    #[test]
    fn search_round_trip() {
        // Forward hit at P, then backward from P + len(T) returns P.
        let text = "alpha beta gamma beta".to_string();
        let doc = Document::with_cursor(&text, 0);
        let lines = vec![text.clone()];

        let hit = search(&lines, 0, &doc, &forward("beta"), false, 1, false, false).unwrap();
        assert_eq!(hit.cursor, 6);

        let after = doc.at(hit.cursor + 4);
        let back = search(&lines, 0, &after, &backward("beta"), false, 1, false, false).unwrap();
        assert_eq!(back.cursor, 6);
    }

    #[test]
    fn forward_wraps_within_a_single_line() {
        let text = "needle haystack".to_string();
        let doc = Document::with_cursor(&text, 10);
        let lines = vec![text.clone()];

        let hit = search(&lines, 0, &doc, &forward("needle"), false, 1, false, true).unwrap();
        assert_eq!(hit, SearchHit { working_index: 0, cursor: 0 });
    }

    #[test]
    fn backward_wraps_within_a_single_line() {
        let text = "haystack needle".to_string();
        let doc = Document::with_cursor(&text, 0);
        let lines = vec![text.clone()];

        let hit = search(&lines, 0, &doc, &backward("needle"), false, 1, false, true).unwrap();
        assert_eq!(hit.cursor, 9);
    }

    #[test]
    fn wrap_walks_other_working_lines() {
        let lines = vec!["old entry".to_string(), "current".to_string()];
        let doc = Document::with_cursor("current", 0);

        let hit = search(&lines, 1, &doc, &forward("entry"), false, 1, false, true).unwrap();
        assert_eq!(hit, SearchHit { working_index: 0, cursor: 4 });
    }

    #[test]
    fn missing_query_fails_with_direction_wording() {
        let lines = vec!["nothing here".to_string()];
        let doc = Document::with_cursor("nothing here", 0);

        let err = search(&lines, 0, &doc, &forward("absent"), false, 1, false, true).unwrap_err();
        assert_eq!(err, SearchError::HitBottom("absent".to_string()));
        assert_eq!(err.to_string(), "Search hit BOTTOM without match for: absent");

        let err = search(&lines, 0, &doc, &backward("absent"), false, 1, false, true).unwrap_err();
        assert_eq!(err.to_string(), "Search hit TOP without match for: absent");
    }

    #[test]
    fn repeated_misses_are_idempotent() {
        // Wrap enabled, query absent: every attempt misses the same way.
        let lines = vec!["aaa".to_string()];
        let doc = Document::with_cursor("aaa", 1);
        for _ in 0..3 {
            let result = search(&lines, 0, &doc, &forward("zzz"), false, 1, false, true);
            assert!(result.is_err());
        }
        assert_eq!(doc.cursor(), 1);
    }

    #[test]
    fn count_chains_iterations() {
        let text = "x..x..x".to_string();
        let doc = Document::with_cursor(&text, 0);
        let lines = vec![text.clone()];

        let hit = search(&lines, 0, &doc, &forward("x"), false, 2, false, false).unwrap();
        assert_eq!(hit.cursor, 6);
    }

    #[test]
    fn count_fails_when_any_iteration_misses() {
        let text = "x..x".to_string();
        let doc = Document::with_cursor(&text, 0);
        let lines = vec![text.clone()];

        assert!(search(&lines, 0, &doc, &forward("x"), false, 3, false, false).is_err());
    }

    // -- rewrite_word_boundaries --------------------------------------------

    #[test]
    fn rewrite_preserves_other_escapes() {
        assert_eq!(rewrite_word_boundaries(r"\d+\<w\>"), r"\d+\b{start}w\b{end}");
        assert_eq!(rewrite_word_boundaries(r"a\\<b"), r"a\\<b");
        assert_eq!(rewrite_word_boundaries("plain"), "plain");
    }
}
