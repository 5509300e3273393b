//! Canary Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! A canary chain is a sequence of signed statements, each promising
//! uncoerced operation until its deadline and naming the hash of the
//! document that preceded it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod statement;
pub mod time;
pub mod version;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use hash::{Hash, HashError};
pub use statement::{ChainTip, RawDocument, SignedStatement};
pub use time::{Duration, Timestamp};
pub use version::{ProtocolVersion, VersionError};
