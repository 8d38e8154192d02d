//! Game resumption tokens
//!
//! A token is the opaque key a browser session carries to find its
//! in-progress game again. Tokens are random UUIDs, rendered and parsed
//! in their canonical hyphenated form.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

/// An opaque per-session key bound to at most one live game
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Token(Uuid);

impl Token {
    /// Mints a new random token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Token {
    /// Mints a new random token (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Token {
    type Err = uuid::Error;

    /// Parses a token from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}
