//! Rebuilding the chain tip from stored proofs.

use crate::store::{ChainArchive, StoreError};
use canary_chain::{ChainValidator, ReplayError};
use canary_core::{ChainTip, Timestamp};
use canary_proof::{ProofError, PublicKey, open_proof};
use tracing::info;

/// A store that does not hold a valid chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    /// Store could not be read
    #[error("Failed to read canary store: {0}")]
    Store(#[from] StoreError),

    /// A stored proof does not open under the trusted key
    #[error("Stored canary {deadline} is not a valid proof: {source}")]
    Proof {
        deadline: Timestamp,
        source: ProofError,
    },

    /// A proof is filed under a deadline other than its own
    #[error("Stored canary filed under {filed} declares deadline {declared}")]
    Misfiled {
        filed: Timestamp,
        declared: Timestamp,
    },

    /// Stored proofs do not link up
    #[error(transparent)]
    Chain(#[from] ReplayError),
}

/// Verify every stored proof and return the tip of the stored chain
///
/// # Errors
///
/// Returns error if any proof fails to open or the history is not a chain
pub fn recover<A: ChainArchive + ?Sized>(
    archive: &A,
    key: &PublicKey,
) -> Result<Option<ChainTip>, RecoveryError> {
    let stored = archive.load_all()?;
    let count = stored.len();

    let mut history = Vec::with_capacity(count);
    for canary in stored {
        let statement = open_proof(key, &canary.document).map_err(|source| RecoveryError::Proof {
            deadline: canary.deadline,
            source,
        })?;
        if statement.deadline != canary.deadline {
            return Err(RecoveryError::Misfiled {
                filed: canary.deadline,
                declared: statement.deadline,
            });
        }
        history.push((statement, canary.document));
    }

    let tip = ChainValidator::new().replay(history)?;
    match &tip {
        Some(tip) => info!(count, deadline = %tip.deadline(), "Recovered canary chain"),
        None => info!("Canary store is empty"),
    }
    Ok(tip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use canary_chain::PersistenceGateway;
    use canary_core::{Hash, RawDocument, SignedStatement};
    use canary_proof::{CanaryKey, seal_proof};

    fn seal_chain(key: &CanaryKey, store: &MemoryStore, deadlines: &[u64]) -> Vec<RawDocument> {
        let mut previous: Option<Hash> = None;
        let mut docs = Vec::new();
        for seconds in deadlines {
            let deadline = Timestamp::new(*seconds, 0);
            let doc = seal_proof(key, &SignedStatement::new(deadline, previous)).unwrap();
            store.store(&doc, deadline).unwrap();
            previous = Some(doc.hash());
            docs.push(doc);
        }
        docs
    }

    #[test]
    fn test_recover_empty() {
        let key = CanaryKey::generate();
        assert_eq!(recover(&MemoryStore::new(), &key.public_key()), Ok(None));
    }

    #[test]
    fn test_recover_chain() {
        let key = CanaryKey::generate();
        let store = MemoryStore::new();
        let docs = seal_chain(&key, &store, &[100, 200, 300]);

        let tip = recover(&store, &key.public_key()).unwrap().unwrap();
        assert_eq!(tip.document, docs[2]);
        assert_eq!(tip.deadline(), Timestamp::new(300, 0));
    }

    #[test]
    fn test_recover_rejects_foreign_key() {
        let key = CanaryKey::generate();
        let store = MemoryStore::new();
        seal_chain(&key, &store, &[100]);

        let err = recover(&store, &CanaryKey::generate().public_key()).unwrap_err();
        assert!(matches!(
            err,
            RecoveryError::Proof {
                source: ProofError::BadSignature,
                ..
            }
        ));
    }

    #[test]
    fn test_recover_rejects_broken_link() {
        let key = CanaryKey::generate();
        let store = MemoryStore::new();
        seal_chain(&key, &store, &[100]);

        let deadline = Timestamp::new(200, 0);
        let orphan = SignedStatement::new(deadline, Some(Hash::compute(b"elsewhere")));
        store.store(&seal_proof(&key, &orphan).unwrap(), deadline).unwrap();

        match recover(&store, &key.public_key()) {
            Err(RecoveryError::Chain(err)) => assert_eq!(err.position, 1),
            other => panic!("expected broken chain, got {:?}", other),
        }
    }

    #[test]
    fn test_recover_rejects_misfiled_proof() {
        let key = CanaryKey::generate();
        let store = MemoryStore::new();
        let doc = seal_proof(&key, &SignedStatement::new(Timestamp::new(100, 0), None)).unwrap();
        store.store(&doc, Timestamp::new(999, 0)).unwrap();

        assert!(matches!(
            recover(&store, &key.public_key()),
            Err(RecoveryError::Misfiled { .. })
        ));
    }
}
