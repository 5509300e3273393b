//! Chain-extension validation.
//!
//! Checks run in a fixed order and the first failure wins:
//! version, future deadline, increasing deadline, predecessor hash.

use crate::error::{Rejection, ReplayError};
use canary_core::{ChainTip, ProtocolVersion, RawDocument, SignedStatement, Timestamp};

/// Decides whether a verified statement may follow the current tip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainValidator {
    supported: ProtocolVersion,
}

impl ChainValidator {
    /// Create a validator for the current protocol version
    #[must_use]
    pub const fn new() -> Self {
        Self {
            supported: ProtocolVersion::CURRENT,
        }
    }

    /// Version this validator accepts
    #[must_use]
    pub const fn supported_version(&self) -> ProtocolVersion {
        self.supported
    }

    /// Validate a new submission against the tip at time `now`
    ///
    /// An empty chain accepts any current-version statement with a future
    /// deadline, whatever it names as `previous`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check
    pub fn validate(
        &self,
        tip: Option<&ChainTip>,
        candidate: &SignedStatement,
        now: Timestamp,
    ) -> Result<(), Rejection> {
        self.check_version(candidate)?;

        if candidate.deadline <= now {
            return Err(Rejection::DeadlineNotFuture {
                deadline: candidate.deadline,
                now,
            });
        }

        Self::check_successor(tip, candidate)
    }

    /// Validate a historical link, without reference to the clock
    ///
    /// # Errors
    ///
    /// Returns the first failing check
    pub fn validate_link(
        &self,
        tip: Option<&ChainTip>,
        candidate: &SignedStatement,
    ) -> Result<(), Rejection> {
        self.check_version(candidate)?;
        Self::check_successor(tip, candidate)
    }

    /// Walk a deadline-ordered history and return its final tip
    ///
    /// # Errors
    ///
    /// Returns the position of the first document that breaks the chain
    pub fn replay<I>(&self, history: I) -> Result<Option<ChainTip>, ReplayError>
    where
        I: IntoIterator<Item = (SignedStatement, RawDocument)>,
    {
        let mut tip: Option<ChainTip> = None;
        for (position, (statement, document)) in history.into_iter().enumerate() {
            self.validate_link(tip.as_ref(), &statement)
                .map_err(|reason| ReplayError { position, reason })?;
            tip = Some(ChainTip::new(document, statement));
        }
        Ok(tip)
    }

    fn check_version(&self, candidate: &SignedStatement) -> Result<(), Rejection> {
        if candidate.version != self.supported {
            return Err(Rejection::UnsupportedVersion {
                found: candidate.version,
                supported: self.supported,
            });
        }
        Ok(())
    }

    fn check_successor(tip: Option<&ChainTip>, candidate: &SignedStatement) -> Result<(), Rejection> {
        let Some(tip) = tip else {
            return Ok(());
        };

        if candidate.deadline <= tip.deadline() {
            return Err(Rejection::DeadlineNotIncreasing {
                deadline: candidate.deadline,
                previous: tip.deadline(),
            });
        }

        let expected = tip.hash();
        if candidate.previous != Some(expected) {
            return Err(Rejection::BrokenLinkage {
                expected,
                found: candidate.previous,
            });
        }

        Ok(())
    }
}

impl Default for ChainValidator {
    fn default() -> Self {
        Self::new()
    }
}
