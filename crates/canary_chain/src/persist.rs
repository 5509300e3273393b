//! Boundary to the durable canary store.

use crate::error::PersistError;
use canary_core::{RawDocument, Timestamp};
use std::sync::Arc;

/// Durable, append-only storage for accepted documents
///
/// `store` must not return `Ok` until the document is durable. Documents
/// are keyed at least by deadline so the ordered chain can be rebuilt.
pub trait PersistenceGateway: Send + Sync {
    /// Durably record an accepted document
    ///
    /// # Errors
    ///
    /// Returns error if the document was not durably written
    fn store(&self, document: &RawDocument, deadline: Timestamp) -> Result<(), PersistError>;
}

impl<T: PersistenceGateway + ?Sized> PersistenceGateway for Arc<T> {
    fn store(&self, document: &RawDocument, deadline: Timestamp) -> Result<(), PersistError> {
        (**self).store(document, deadline)
    }
}
