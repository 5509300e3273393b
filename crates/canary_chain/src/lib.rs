//! Canary Chain
//!
//! Decides whether a verified statement may extend the append-only canary
//! chain, and guards the current tip against concurrent readers while a
//! single writer validates, persists, and commits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod guard;
pub mod persist;
pub mod validator;

pub use error::{ExtensionError, PersistError, Rejection, ReplayError};
pub use guard::ChainGuard;
pub use persist::PersistenceGateway;
pub use validator::ChainValidator;
