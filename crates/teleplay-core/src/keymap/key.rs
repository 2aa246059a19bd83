//! Key identifiers.
//!
//! # Why a closed set?
//!
//! A host prints a summary of every control and the keys that trigger it, and
//! a player maps physical keyboard keys onto the same names.  Both sides must
//! agree on the vocabulary, so keys are an enum rather than free-form strings.
//! Esc is deliberately absent: the player uses it to leave a session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// A key that a control can own.
///
/// Serialized by name (see [`Key::name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Digits
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,

    // Arrows
    Up,
    Down,
    Left,
    Right,

    // Editing and modifiers
    Space,
    Enter,
    Tab,
    Backspace,
    Shift,
    Ctrl,
    Alt,
}

impl Key {
    /// Every key in the set, in display order.
    pub const ALL: [Key; 47] = [
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
        Key::G,
        Key::H,
        Key::I,
        Key::J,
        Key::K,
        Key::L,
        Key::M,
        Key::N,
        Key::O,
        Key::P,
        Key::Q,
        Key::R,
        Key::S,
        Key::T,
        Key::U,
        Key::V,
        Key::W,
        Key::X,
        Key::Y,
        Key::Z,
        Key::Digit0,
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::Digit5,
        Key::Digit6,
        Key::Digit7,
        Key::Digit8,
        Key::Digit9,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::Space,
        Key::Enter,
        Key::Tab,
        Key::Backspace,
        Key::Shift,
        Key::Ctrl,
        Key::Alt,
    ];

    /// The canonical upper-case name used on the wire and in listings.
    pub fn name(self) -> &'static str {
        match self {
            Key::A => "A",
            Key::B => "B",
            Key::C => "C",
            Key::D => "D",
            Key::E => "E",
            Key::F => "F",
            Key::G => "G",
            Key::H => "H",
            Key::I => "I",
            Key::J => "J",
            Key::K => "K",
            Key::L => "L",
            Key::M => "M",
            Key::N => "N",
            Key::O => "O",
            Key::P => "P",
            Key::Q => "Q",
            Key::R => "R",
            Key::S => "S",
            Key::T => "T",
            Key::U => "U",
            Key::V => "V",
            Key::W => "W",
            Key::X => "X",
            Key::Y => "Y",
            Key::Z => "Z",
            Key::Digit0 => "0",
            Key::Digit1 => "1",
            Key::Digit2 => "2",
            Key::Digit3 => "3",
            Key::Digit4 => "4",
            Key::Digit5 => "5",
            Key::Digit6 => "6",
            Key::Digit7 => "7",
            Key::Digit8 => "8",
            Key::Digit9 => "9",
            Key::Up => "UP",
            Key::Down => "DOWN",
            Key::Left => "LEFT",
            Key::Right => "RIGHT",
            Key::Space => "SPACE",
            Key::Enter => "ENTER",
            Key::Tab => "TAB",
            Key::Backspace => "BACKSPACE",
            Key::Shift => "SHIFT",
            Key::Ctrl => "CTRL",
            Key::Alt => "ALT",
        }
    }

    /// Maps a typed character to a key, case-insensitively.
    ///
    /// Returns `None` for characters outside the key set.
    pub fn from_char(c: char) -> Option<Key> {
        match c {
            ' ' => Some(Key::Space),
            '\t' => Some(Key::Tab),
            '\n' | '\r' => Some(Key::Enter),
            c if c.is_ascii_alphanumeric() => {
                let mut buf = [0u8; 4];
                let upper = c.to_ascii_uppercase().encode_utf8(&mut buf);
                Key::lookup(upper)
            }
            _ => None,
        }
    }

    fn lookup(name: &str) -> Option<Key> {
        Key::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Key {
    type Err = ConfigError;

    /// Parses an exact key name.
    ///
    /// Lower-case names are rejected, but the error carries the upper-case
    /// spelling when that one is valid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(key) = Key::lookup(s) {
            return Ok(key);
        }
        let upper = s.to_uppercase();
        let suggestion = Key::lookup(&upper).map(|k| k.name().to_string());
        Err(ConfigError::UnknownKey {
            key: s.to_string(),
            suggestion,
        })
    }
}

impl TryFrom<String> for Key {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.name().to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
