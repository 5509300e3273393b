//! Concurrency-safe holder of the chain tip.
//!
//! Readers take cheap snapshots. A writer holds the lock exclusively from
//! validation through persistence to commit, so no reader ever sees a tip
//! whose document is not yet durable.

use crate::error::ExtensionError;
use crate::persist::PersistenceGateway;
use crate::validator::ChainValidator;
use canary_core::{ChainTip, RawDocument, SignedStatement, Timestamp};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Single owner of the current tip for one service instance
pub struct ChainGuard {
    validator: ChainValidator,
    gateway: Arc<dyn PersistenceGateway>,
    tip: RwLock<Option<Arc<ChainTip>>>,
}

impl ChainGuard {
    /// Create a guard over an empty chain
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            validator: ChainValidator::new(),
            gateway,
            tip: RwLock::new(None),
        }
    }

    /// Create a guard over a tip recovered from durable storage
    #[must_use]
    pub fn restore(gateway: Arc<dyn PersistenceGateway>, tip: Option<ChainTip>) -> Self {
        Self {
            validator: ChainValidator::new(),
            gateway,
            tip: RwLock::new(tip.map(Arc::new)),
        }
    }

    /// Snapshot of the current tip
    #[must_use]
    pub fn read_tip(&self) -> Option<Arc<ChainTip>> {
        self.read().clone()
    }

    /// Whether any canary has ever been accepted
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.read().is_some()
    }

    /// Try to make `candidate` the new tip
    ///
    /// `candidate` must already be signature-verified and decoded from
    /// `document`. On any error the tip is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if validation fails, `PersistFailed` if the
    /// document could not be stored
    pub fn propose_extension(
        &self,
        candidate: SignedStatement,
        document: RawDocument,
        now: Timestamp,
    ) -> Result<Arc<ChainTip>, ExtensionError> {
        debug!(deadline = %candidate.deadline, document = ?document, "Proposed canary extension");

        let mut tip = self.write();

        if let Err(rejection) = self.validator.validate(tip.as_deref(), &candidate, now) {
            warn!(code = rejection.code(), %rejection, "Rejected canary");
            return Err(rejection.into());
        }

        if let Err(err) = self.gateway.store(&document, candidate.deadline) {
            error!(deadline = %candidate.deadline, %err, "Failed to save valid proof to store");
            return Err(err.into());
        }

        let next = Arc::new(ChainTip::new(document, candidate));
        *tip = Some(Arc::clone(&next));
        info!(deadline = %next.deadline(), hash = %next.hash(), "Accepted new canary");
        Ok(next)
    }

    // The tip is swapped in one assignment, so a poisoned lock still
    // holds a whole value.
    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<ChainTip>>> {
        self.tip.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<ChainTip>>> {
        self.tip.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChainGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainGuard")
            .field("validator", &self.validator)
            .field("tip", &self.read_tip())
            .finish_non_exhaustive()
    }
}
