//! Strongly-typed migration identifier.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a migration, derived from its file stem (e.g.
/// `0002_add_country`).
///
/// Identifiers are opaque to everything except the loader, which extracts the
/// numeric sort prefix. The only invariant is that the identifier is
/// non-empty and contains no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    /// Create a new identifier, panicking if it is invalid.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(Self::is_valid(&id), "invalid migration identifier: {id:?}");
        Self(id)
    }

    /// Try to create a new identifier, returning `None` if it is empty or
    /// contains whitespace.
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Self::is_valid(&id).then_some(Self(id))
    }

    fn is_valid(id: &str) -> bool {
        !id.is_empty() && !id.chars().any(char::is_whitespace)
    }

    /// Numeric prefix before the first `_`, if any (`0002_add_country` → 2).
    pub fn sequence_prefix(&self) -> Option<u64> {
        let digits: &str = self.0.split('_').next().unwrap_or_default();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MigrationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationId::try_new(s).ok_or_else(|| {
            serde::de::Error::custom("MigrationId must be non-empty without whitespace")
        })
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for MigrationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
