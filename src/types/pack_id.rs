//! Content-addressed context pack identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of a SHA-256 digest rendered as hex.
pub const PACK_ID_HEX_LEN: usize = 64;

/// Error returned when parsing a [`ContextPackId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackIdError {
    /// Wrong number of characters.
    #[error("context pack id must be 64 hex chars, got {0}")]
    InvalidLength(usize),
    /// A character outside `[0-9a-f]`.
    #[error("context pack id contains non-lowercase-hex character {0:?}")]
    InvalidCharacter(char),
}

/// SHA-256 of a snapshot's canonical serialization, as lowercase hex.
///
/// This is the content address under which stores persist a pack.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContextPackId(String);

impl ContextPackId {
    /// Build an id from a raw SHA-256 digest.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse and validate a hex id.
    pub fn parse(s: &str) -> Result<Self, PackIdError> {
        if s.len() != PACK_ID_HEX_LEN {
            return Err(PackIdError::InvalidLength(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !matches!(c, '0'..='9' | 'a'..='f')) {
            return Err(PackIdError::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner hex string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContextPackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContextPackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContextPackId {
    type Error = PackIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ContextPackId> for String {
    fn from(id: ContextPackId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ContextPackId {
    type Err = PackIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
