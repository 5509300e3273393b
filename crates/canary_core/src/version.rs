//! Canary protocol version tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Protocol version of a canary statement, written as `v<N>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtocolVersion(u32);

impl ProtocolVersion {
    /// The only version this service accepts
    pub const CURRENT: Self = Self(1);

    /// Create a new version tag
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Get the numeric tag
    #[must_use]
    pub const fn tag(&self) -> u32 {
        self.0
    }

    /// Parse from `v<N>` text
    ///
    /// Only the canonical spelling is accepted: `N` is plain ASCII digits
    /// without a sign or leading zero, so each version has one text form.
    ///
    /// # Errors
    ///
    /// Returns error if format is invalid
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let digits = s
            .strip_prefix('v')
            .ok_or_else(|| VersionError::InvalidFormat(s.to_string()))?;
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return Err(VersionError::InvalidComponent(digits.to_string()));
        }
        let tag = digits
            .parse()
            .map_err(|_| VersionError::InvalidComponent(digits.to_string()))?;
        Ok(Self(tag))
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for ProtocolVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Version-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Missing the `v` prefix
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),
    /// Tag is not a number
    #[error("Invalid version component: {0}")]
    InvalidComponent(String),
}
