//! Musical key resolution
//!
//! Maps filenames to canonical key names and key pairs to a minimal semitone shift.
//!
//! # Pitch class table
//!
//! The table is static data, not derived from music theory at runtime. Enharmonic
//! spellings are listed explicitly. Minor keys carry the pitch class of their
//! relative major, so `"d minor"` and `"f major"` both map to 5 and transposing
//! between them is a no-op.
//!
//! # Shift arithmetic
//!
//! `raw = pc(target) - pc(original)` is folded onto the 12-point circle only when
//! it strictly exceeds 6 in magnitude. A raw difference of exactly +6 stays +6 and
//! exactly -6 stays -6.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::{Error, Result};

/// Key mode (major or minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    Major,
    Minor,
}

impl KeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::Major => "major",
            KeyMode::Minor => "minor",
        }
    }
}

/// Musical key detected in a filename
///
/// `note` is the lowercase tonic with optional accidental (`"c#"`, `"eb"`).
/// Not guaranteed to be present in the pitch class table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub note: String,
    pub mode: KeyMode,
}

impl Key {
    /// Canonical lowercase form, e.g. `"c# major"`
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Pitch class from the table, if this key is listed
    pub fn pitch_class(&self) -> Option<u8> {
        pitch_class(&self.canonical())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.note, self.mode.as_str())
    }
}

/// Canonical key name → pitch class, in display order
pub const KEY_TABLE: &[(&str, u8)] = &[
    // Major keys
    ("c major", 0),
    ("c# major", 1),
    ("db major", 1),
    ("d major", 2),
    ("d# major", 3),
    ("eb major", 3),
    ("e major", 4),
    ("f major", 5),
    ("f# major", 6),
    ("gb major", 6),
    ("g major", 7),
    ("g# major", 8),
    ("ab major", 8),
    ("a major", 9),
    ("a# major", 10),
    ("bb major", 10),
    ("b major", 11),
    // Minor keys (relative major pitch class)
    ("a minor", 0),
    ("a# minor", 1),
    ("bb minor", 1),
    ("b minor", 2),
    ("c minor", 3),
    ("c# minor", 4),
    ("db minor", 4),
    ("d minor", 5),
    ("d# minor", 6),
    ("eb minor", 6),
    ("e minor", 7),
    ("f minor", 8),
    ("f# minor", 9),
    ("gb minor", 9),
    ("g minor", 10),
    ("g# minor", 11),
    ("ab minor", 11),
];

static PITCH_CLASSES: Lazy<HashMap<&'static str, u8>> =
    Lazy::new(|| KEY_TABLE.iter().copied().collect());

/// Mode suffixes, tried in order at each candidate position.
/// Anything starting with "maj" is major, everything else minor.
const MODE_SUFFIXES: [&str; 4] = ["maj", "minor", "major", "min"];

/// Look up the pitch class of a canonical key name
pub fn pitch_class(key: &str) -> Option<u8> {
    PITCH_CLASSES.get(key).copied()
}

/// All table entries in display order
pub fn supported_keys() -> impl Iterator<Item = (&'static str, u8)> {
    KEY_TABLE.iter().copied()
}

/// Extract a musical key from a filename
///
/// Whitespace and underscores are removed and the name is lowercased before
/// searching for the leftmost `<a-g>[#b]?(maj|minor|major|min)` occurrence.
///
/// ```
/// use keyshift_common::key::extract_key;
///
/// let key = extract_key("Riff_Dminor_v2.wav").unwrap();
/// assert_eq!(key.canonical(), "d minor");
/// assert!(extract_key("track1.mp3").is_none());
/// ```
pub fn extract_key(filename: &str) -> Option<Key> {
    let normalized: String = filename
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_lowercase();
    let bytes = normalized.as_bytes();

    for start in 0..bytes.len() {
        if !(b'a'..=b'g').contains(&bytes[start]) {
            continue;
        }

        // Greedy accidental first, then without
        let mut note_ends = Vec::with_capacity(2);
        if matches!(bytes.get(start + 1), Some(b'#') | Some(b'b')) {
            note_ends.push(start + 2);
        }
        note_ends.push(start + 1);

        for note_end in note_ends {
            let rest = &bytes[note_end..];
            if let Some(suffix) = MODE_SUFFIXES.iter().find(|s| rest.starts_with(s.as_bytes())) {
                let mode = if suffix.starts_with("maj") {
                    KeyMode::Major
                } else {
                    KeyMode::Minor
                };
                // Note bytes are ASCII, so this slice is on char boundaries
                let note = normalized[start..note_end].to_string();
                return Some(Key { note, mode });
            }
        }
    }

    None
}

/// Minimal signed semitone shift from `original` to `target`
///
/// Both arguments are canonical key names. Fails with [`Error::UnknownKey`]
/// when either is missing from the table.
pub fn semitone_shift(original: &str, target: &str) -> Result<i32> {
    let from = pitch_class(original).ok_or_else(|| Error::UnknownKey(original.to_string()))?;
    let to = pitch_class(target).ok_or_else(|| Error::UnknownKey(target.to_string()))?;

    let raw = i32::from(to) - i32::from(from);
    let shift = if raw > 6 {
        raw - 12
    } else if raw < -6 {
        raw + 12
    } else {
        raw
    };

    Ok(shift)
}
