//! Time types for canary deadlines.
//!
//! Deadlines are absolute wall clock instants. The chain logic never reads
//! the clock itself; callers pass "now" in explicitly.

use crate::error::CoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wall clock timestamp since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl Timestamp {
    /// Maximum nanoseconds per second
    pub const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Create a new timestamp
    #[must_use]
    pub fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Get current timestamp
    ///
    /// A clock set before the epoch reads as the epoch itself.
    #[must_use]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        }
    }

    /// Convert from a chrono UTC datetime
    ///
    /// # Errors
    ///
    /// Returns error for instants before the Unix epoch
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self, CoreError> {
        let seconds = u64::try_from(dt.timestamp()).map_err(|_| CoreError::InvalidTimestamp {
            reason: format!("{} is before the Unix epoch", dt),
        })?;
        Ok(Self {
            seconds,
            nanos: dt.timestamp_subsec_nanos(),
        })
    }

    /// Convert to a chrono UTC datetime, if representable
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.seconds).ok()?;
        DateTime::from_timestamp(seconds, self.nanos)
    }

    /// Parse an RFC 3339 timestamp such as `2026-11-18T00:00:00Z`
    ///
    /// # Errors
    ///
    /// Returns error if the text is not RFC 3339 or precedes the epoch
    pub fn parse_rfc3339(s: &str) -> Result<Self, CoreError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| CoreError::InvalidTimestamp {
            reason: format!("{}: {}", s, e),
        })?;
        Self::from_datetime(dt.with_timezone(&Utc))
    }

    /// Render as RFC 3339, if representable
    #[must_use]
    pub fn to_rfc3339(&self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    /// Add a duration
    #[must_use]
    pub fn add(&self, duration: &Duration) -> Self {
        let mut seconds = self.seconds.saturating_add(duration.seconds);
        let mut nanos = self.nanos + duration.nanos;

        if nanos >= Self::NANOS_PER_SEC {
            seconds = seconds.saturating_add(1);
            nanos -= Self::NANOS_PER_SEC;
        }

        Self { seconds, nanos }
    }

    /// Get duration since another timestamp, zero if `earlier` is later
    #[must_use]
    pub fn duration_since(&self, earlier: &Timestamp) -> Duration {
        if self <= earlier {
            return Duration::zero();
        }
        let mut seconds = self.seconds - earlier.seconds;
        let mut nanos = i64::from(self.nanos) - i64::from(earlier.nanos);

        if nanos < 0 {
            seconds -= 1;
            nanos += i64::from(Self::NANOS_PER_SEC);
        }

        Duration {
            seconds,
            nanos: nanos as u32,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_rfc3339() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}.{:09}", self.seconds, self.nanos),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = self
            .to_rfc3339()
            .ok_or_else(|| serde::ser::Error::custom("timestamp out of range"))?;
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&s).map_err(serde::de::Error::custom)
    }
}

/// A duration between timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    pub seconds: u64,
    pub nanos: u32,
}

impl Duration {
    /// Create a new duration
    #[must_use]
    pub const fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Zero duration
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }

    /// Duration from seconds
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Duration from whole days
    #[must_use]
    pub const fn from_days(days: u64) -> Self {
        Self::from_secs(days.saturating_mul(86_400))
    }

    /// Get total seconds
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.seconds
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}
