//! Canary proofs.
//!
//! A proof is a JSON envelope holding a statement and an Ed25519 signature
//! over the statement's exact bytes. Opening a proof is the only way to
//! obtain a `SignedStatement` from untrusted input.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod key;
pub mod proof;

pub use key::{CanaryKey, KeyError, PublicKey};
pub use proof::{ProofError, open_proof, seal_proof};
