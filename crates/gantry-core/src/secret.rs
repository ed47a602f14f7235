//! Opaque wrapper for credential values

use std::fmt;

/// Fixed mask emitted by every formatting path of a [`Secret`].
pub const MASK: &str = "******";

/// A string value that must never reach a log in clear text.
///
/// `Display` and `Debug` both render the fixed mask; the real value is only
/// reachable through [`Secret::expose`], which call sites use at the single
/// point where the value becomes a literal process argument.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reveal the wrapped value.
    ///
    /// Only call this where the value is handed directly to a spawned
    /// process; everywhere else the masked formatting applies.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
