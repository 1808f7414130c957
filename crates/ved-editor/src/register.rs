//! Clipboard payloads and registers.
//!
//! Every yank, delete, and paste is tagged with a [`RegisterKind`] so the
//! paste side knows where the text goes: character-wise payloads land at
//! the cursor, line-wise payloads on the line above/below, block-wise
//! payloads as a column. Named registers (`"a`–`"z`, `"0`–`"9`) are a
//! separate map in [`crate::state::ViState`]; this module provides the
//! default (unnamed) clipboard.

// ---------------------------------------------------------------------------
// RegisterKind
// ---------------------------------------------------------------------------

/// The shape of a clipboard payload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// A span within lines; pastes at the cursor.
    #[default]
    Characters,
    /// Whole lines; pastes above or below the current line.
    Lines,
    /// A rectangular column; pastes one fragment per line.
    Block,
}

/// Where a paste lands relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteMode {
    /// `p` — after the cursor / below the current line.
    After,
    /// `P` — before the cursor / above the current line.
    Before,
}

// ---------------------------------------------------------------------------
// RegisterContent
// ---------------------------------------------------------------------------

/// Text plus its paste shape.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterContent {
    pub text: String,
    pub kind: RegisterKind,
}

impl RegisterContent {
    #[must_use]
    pub fn characters(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: RegisterKind::Characters }
    }

    #[must_use]
    pub fn lines(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: RegisterKind::Lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Clipboard
// ---------------------------------------------------------------------------

/// The default clipboard: a single most-recent payload.
#[derive(Debug, Default)]
pub struct Clipboard {
    content: RegisterContent,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, content: RegisterContent) {
        self.content = content;
    }

    /// Store plain text as a character-wise payload.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = RegisterContent::characters(text);
    }

    #[must_use]
    pub const fn get(&self) -> &RegisterContent {
        &self.content
    }
}

/// True for characters usable as register names (`"a y y` etc.).
#[inline]
#[must_use]
pub fn is_register_name(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn clipboard_keeps_most_recent_payload() {
        let mut clip = Clipboard::new();
        clip.set_text("first");
        clip.set(RegisterContent::lines("second"));
        assert_eq!(clip.get().text, "second");
        assert_eq!(clip.get().kind, RegisterKind::Lines);
    }

    #[test]
    fn register_names() {
        assert!(is_register_name('a'));
        assert!(is_register_name('z'));
        assert!(is_register_name('0'));
        assert!(!is_register_name('A'));
        assert!(!is_register_name('"'));
    }
}
