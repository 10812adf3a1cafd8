//! Severity levels
//!
//! A [`Level`] is a small value object: a numeric id and a label. Identity is
//! the id alone, so callers can define their own levels next to the built-in
//! ones as long as they pick ids that do not collide with them (the built-ins
//! use 0 through 5).

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

/// A log severity: numeric id plus label
#[derive(Debug, Clone)]
pub struct Level {
    id: i32,
    label: Cow<'static, str>,
}

impl Level {
    /// The process cannot continue safely
    pub const CRITICAL: Level = Level::builtin(0, "CRITICAL");
    /// A bug or unexpected failure in the program itself
    pub const ERROR: Level = Level::builtin(1, "ERROR");
    /// A failure operations staff can probably fix (connectivity, disk, credentials)
    pub const OPS_ERROR: Level = Level::builtin(2, "OPS_ERROR");
    /// Something unusual that did not fail
    pub const WARNING: Level = Level::builtin(3, "WARNING");
    /// Routine information
    pub const INFO: Level = Level::builtin(4, "INFO");
    /// Developer detail
    pub const DEBUG: Level = Level::builtin(5, "DEBUG");

    const fn builtin(id: i32, label: &'static str) -> Self {
        Self {
            id,
            label: Cow::Borrowed(label),
        }
    }

    /// Define a custom level
    pub fn new(id: i32, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// Numeric identity of this level
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Label written into rendered events
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Built-in levels, most severe first
    pub fn builtins() -> [Level; 6] {
        [
            Level::CRITICAL,
            Level::ERROR,
            Level::OPS_ERROR,
            Level::WARNING,
            Level::INFO,
            Level::DEBUG,
        ]
    }

    /// Look up a built-in level by label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Level> {
        Self::builtins()
            .into_iter()
            .find(|level| level.label.eq_ignore_ascii_case(label))
    }

    /// Whether this is one of the built-in levels
    pub fn is_builtin(&self) -> bool {
        Self::builtins().iter().any(|level| level.id == self.id)
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}
