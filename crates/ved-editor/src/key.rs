//! Key events.
//!
//! The terminal frontend translates raw input into [`KeyPress`] values; the
//! core never sees bytes or escape sequences. A `KeyPress` is a key code
//! plus a modifier bitmask, small enough to copy freely and to store in the
//! dot-repeat log.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a keypress.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A key identity, independent of modifiers.
///
/// Printable input arrives as [`Key::Char`]; everything else the core cares
/// about has its own variant. Keys the core does not bind simply fall
/// through unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Backspace,
    Tab,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

// ---------------------------------------------------------------------------
// KeyPress
// ---------------------------------------------------------------------------

/// One keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self { key, modifiers: Modifiers::empty() }
    }

    /// A plain printable character.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    /// A character with Ctrl held.
    #[must_use]
    pub const fn ctrl(c: char) -> Self {
        Self { key: Key::Char(c), modifiers: Modifiers::CTRL }
    }

    /// The printable character this press produces, if any.
    ///
    /// `None` for special keys and for chords with Ctrl or Alt held
    /// (Shift is already folded into the character by the frontend).
    #[must_use]
    pub const fn as_char(self) -> Option<char> {
        match self.key {
            Key::Char(c)
                if !self.modifiers.intersects(Modifiers::CTRL.union(Modifiers::ALT)) =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ctrl(self, c: char) -> bool {
        self.key == Key::Char(c) && self.modifiers.contains(Modifiers::CTRL)
    }
}

impl From<char> for KeyPress {
    fn from(c: char) -> Self {
        Self::char(c)
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
    fn plain_char_round_trips() {
        assert_eq!(KeyPress::char('x').as_char(), Some('x'));
    }

    #[test]
    fn ctrl_chord_is_not_a_char() {
        assert_eq!(KeyPress::ctrl('r').as_char(), None);
        assert!(KeyPress::ctrl('r').is_ctrl('r'));
        assert!(!KeyPress::char('r').is_ctrl('r'));
    }

    #[test]
    fn special_keys_are_not_chars() {
        assert_eq!(KeyPress::new(Key::Escape).as_char(), None);
        assert_eq!(KeyPress::new(Key::Enter).as_char(), None);
    }
}
