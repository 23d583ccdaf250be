use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Globally unique identity of a mod package, e.g. `Ludeon.RimWorld.Royalty`.
///
/// Comparison, hashing and ordering are case-insensitive; the original
/// spelling is kept for display. An identity is never empty.
#[derive(Debug, Clone)]
pub struct ModId {
    display: String,
    key: String,
}

/// Returned when parsing a blank identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mod identity must not be empty")]
pub struct EmptyModId;

impl ModId {
    /// Parse an identity, trimming surrounding whitespace.
    ///
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            display: trimmed.to_string(),
            key: trimmed.to_lowercase(),
        })
    }

    /// The identity as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lowercased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FromStr for ModId {
    type Err = EmptyModId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(EmptyModId)
    }
}

impl PartialEq for ModId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ModId {}

impl Hash for ModId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ModId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl Serialize for ModId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for ModId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ModId::parse(&raw).ok_or_else(|| serde::de::Error::custom(EmptyModId))
    }
}
