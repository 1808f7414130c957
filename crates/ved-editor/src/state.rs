//! Per-session modal state.
//!
//! [`ViState`] is the mutable state of the input machine that is neither
//! buffer content nor key-processor bookkeeping: the current input mode,
//! a pending operator waiting for its text object, named registers, and
//! the last `f`/`F`/`t`/`T` target for `;`/`,` repeats.

use std::collections::HashMap;

use crate::register::RegisterContent;

// ---------------------------------------------------------------------------
// InputMode
// ---------------------------------------------------------------------------

/// How keys are currently interpreted.
///
/// | Mode           | Behavior                                                |
/// |----------------|---------------------------------------------------------|
/// | Navigation     | Keys are commands; cursor rests on a character          |
/// | Insert         | Keys produce text                                       |
/// | InsertMultiple | Block insert: text lands on every line of the selection |
/// | Replace        | Keys overwrite text until Escape                        |
/// | ReplaceSingle  | Next key overwrites one character, then Navigation      |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMode {
    #[default]
    Navigation,
    Insert,
    InsertMultiple,
    Replace,
    ReplaceSingle,
}

impl InputMode {
    /// True if this mode accepts text input.
    #[inline]
    #[must_use]
    pub const fn is_input(self) -> bool {
        !matches!(self, Self::Navigation)
    }
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// A pending operator, stored when its key is pressed in navigation mode
/// and consumed when a text object resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    Indent,
    Unindent,
    Lowercase,
    Uppercase,
    /// `~` with `tildeop` set.
    SwapCase,
}

impl Operator {
    /// True for operators that remove text from the buffer.
    #[inline]
    #[must_use]
    pub const fn removes_text(self) -> bool {
        matches!(self, Self::Delete | Self::Change)
    }
}

/// The last `f`/`F`/`t`/`T` target, kept for `;` and `,` repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterFind {
    pub character: char,
    pub backwards: bool,
}

// ---------------------------------------------------------------------------
// ViState
// ---------------------------------------------------------------------------

/// Session-wide modal state.
#[derive(Debug, Default)]
pub struct ViState {
    pub input_mode: InputMode,
    /// Operator waiting for a text object, if any.
    pub operator: Option<Operator>,
    /// Repeat count typed before the operator key.
    pub operator_arg: Option<usize>,
    /// Register named before the operator (`"a d w`), if any.
    pub operator_register: Option<char>,
    pub named_registers: HashMap<char, RegisterContent>,
    pub last_character_find: Option<CharacterFind>,
    /// `:set tildeop` — makes `~` behave as an operator.
    pub tilde_operator: bool,
}

impl ViState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an operator is waiting for its text object.
    #[inline]
    #[must_use]
    pub const fn waiting_for_text_object(&self) -> bool {
        self.operator.is_some()
    }

    /// Clear operator-pending state. Called after a text object resolves
    /// and when a sequence is aborted with Escape.
    pub fn reset_operator(&mut self) {
        self.operator = None;
        self.operator_arg = None;
        self.operator_register = None;
    }

    /// Back to navigation, dropping any pending operator.
    pub fn reset(&mut self) {
        self.input_mode = InputMode::Navigation;
        self.reset_operator();
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
    fn default_mode_is_navigation() {
        let state = ViState::new();
        assert_eq!(state.input_mode, InputMode::Navigation);
        assert!(!state.waiting_for_text_object());
    }

    #[test]
    fn reset_operator_clears_all_pending_fields() {
        let mut state = ViState::new();
        state.operator = Some(Operator::Delete);
        state.operator_arg = Some(3);
        state.operator_register = Some('a');
        state.reset_operator();
        assert_eq!(state.operator, None);
        assert_eq!(state.operator_arg, None);
        assert_eq!(state.operator_register, None);
    }

    #[test]
    fn reset_leaves_registers_intact() {
        let mut state = ViState::new();
        state
            .named_registers
            .insert('a', RegisterContent::characters("hello"));
        state.input_mode = InputMode::Insert;
        state.reset();
        assert_eq!(state.input_mode, InputMode::Navigation);
        assert!(state.named_registers.contains_key(&'a'));
    }
}
