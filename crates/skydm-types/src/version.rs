//! Ordered version pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An ordered pair of version labels: the older version first, the newer
/// version second.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionPair {
    pub older: String,
    pub newer: String,
}

impl VersionPair {
    pub fn new(older: impl Into<String>, newer: impl Into<String>) -> Self {
        Self {
            older: older.into(),
            newer: newer.into(),
        }
    }

    /// The lookup key for a diff between these versions: `diff_<older>_<newer>`,
    /// lowercased.
    pub fn diff_key(&self) -> String {
        format!("diff_{}_{}", self.older, self.newer).to_lowercase()
    }

    /// Parse a `older..newer` label.
    pub fn parse(label: &str) -> Result<Self, TypeError> {
        match label.split_once("..") {
            Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok(Self::new(a, b)),
            _ => Err(TypeError::InvalidVersionPair(label.to_string())),
        }
    }
}

impl fmt::Display for VersionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.older, self.newer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_key_is_lowercase() {
        let pair = VersionPair::new("MPL-6", "MPL-7");
        assert_eq!(pair.diff_key(), "diff_mpl-6_mpl-7");
    }

    #[test]
    fn parse_and_display() {
        let pair = VersionPair::parse("v1..v2").unwrap();
        assert_eq!(pair, VersionPair::new("v1", "v2"));
        assert_eq!(pair.to_string(), "v1..v2");
    }

    #[test]
    fn parse_rejects_incomplete_labels() {
        assert!(VersionPair::parse("v1").is_err());
        assert!(VersionPair::parse("..v2").is_err());
        assert!(VersionPair::parse("v1..").is_err());
    }
}
