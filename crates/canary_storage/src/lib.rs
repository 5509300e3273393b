//! Canary Storage
//!
//! Append-only stores for accepted canary proofs, keyed by deadline, and
//! recovery of the chain tip from a store on restart.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod recover;
pub mod store;

pub use recover::{RecoveryError, recover};
pub use store::{ChainArchive, DirectoryStore, MemoryStore, StoreConfig, StoreError, StoredCanary};
