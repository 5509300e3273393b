//! Outcomes of a failed chain extension.

use canary_core::{Hash, ProtocolVersion, Timestamp};

/// Why a candidate statement may not extend the chain
///
/// All rejections are submitter errors: resubmitting the same document
/// will fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Candidate declares a version this service does not speak
    #[error("Unsupported canary version {found} (expected {supported})")]
    UnsupportedVersion {
        found: ProtocolVersion,
        supported: ProtocolVersion,
    },

    /// Candidate deadline is not strictly after acceptance time
    #[error("Canary must have a deadline in the future (deadline {deadline}, now {now})")]
    DeadlineNotFuture { deadline: Timestamp, now: Timestamp },

    /// Candidate deadline does not exceed the current tip's
    #[error("New canary deadline {deadline} must be after previous deadline {previous}")]
    DeadlineNotIncreasing {
        deadline: Timestamp,
        previous: Timestamp,
    },

    /// Candidate does not name the hash of the current tip document
    #[error("Canary must reference preceding canary hash {expected}")]
    BrokenLinkage {
        expected: Hash,
        found: Option<Hash>,
    },
}

impl Rejection {
    /// Stable machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedVersion { .. } => "unsupported_version",
            Self::DeadlineNotFuture { .. } => "deadline_not_future",
            Self::DeadlineNotIncreasing { .. } => "deadline_not_increasing",
            Self::BrokenLinkage { .. } => "broken_linkage",
        }
    }
}

/// The durable store failed to record an accepted document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PersistError {
    message: String,
}

impl PersistError {
    /// Create a new persistence error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Get the failure message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure of `ChainGuard::propose_extension`
///
/// In every case the chain tip is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    /// The validator refused the candidate
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The candidate was valid but could not be stored
    #[error("Failed to persist canary: {0}")]
    PersistFailed(#[from] PersistError),
}

impl ExtensionError {
    /// Stable machine-readable code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.code(),
            Self::PersistFailed(_) => "persist_failed",
        }
    }

    /// Whether retrying the identical candidate can succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistFailed(_))
    }
}

/// A stored history that does not form a valid chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Broken canary chain at position {position}: {reason}")]
pub struct ReplayError {
    /// Zero-based index of the first offending document
    pub position: usize,
    /// What was wrong with it
    pub reason: Rejection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let t = Timestamp::new(1, 0);
        let codes = [
            Rejection::UnsupportedVersion {
                found: ProtocolVersion::new(2),
                supported: ProtocolVersion::CURRENT,
            }
            .code(),
            Rejection::DeadlineNotFuture { deadline: t, now: t }.code(),
            Rejection::DeadlineNotIncreasing {
                deadline: t,
                previous: t,
            }
            .code(),
            Rejection::BrokenLinkage {
                expected: Hash::compute(b"x"),
                found: None,
            }
            .code(),
            ExtensionError::from(PersistError::new("disk full")).code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_only_persist_failure_is_retryable() {
        assert!(ExtensionError::from(PersistError::new("io")).is_retryable());
        let rejected = ExtensionError::from(Rejection::BrokenLinkage {
            expected: Hash::compute(b"x"),
            found: None,
        });
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.code(), "broken_linkage");
    }

    #[test]
    fn test_display() {
        let err = ExtensionError::from(PersistError::new("disk full"));
        assert_eq!(err.to_string(), "Failed to persist canary: disk full");

        let err = ReplayError {
            position: 4,
            reason: Rejection::DeadlineNotIncreasing {
                deadline: Timestamp::new(5, 0),
                previous: Timestamp::new(6, 0),
            },
        };
        assert!(err.to_string().contains("position 4"));
    }
}
