//! Deterministic document ids derived from player tags.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Reference to a stored player document.
///
/// Derived from the player's tag, so the same player always resolves to the
/// same reference no matter how many times (or from which battle log) it is
/// ingested.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Derive the id for a player tag.
    /// Uses SHA256 and keeps the first 16 hex characters.
    pub fn for_tag(tag: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"player|");
        hasher.update(tag.as_bytes());
        let hash = hex::encode(hasher.finalize());
        Self(hash[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}
