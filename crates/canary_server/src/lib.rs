//! Canary Server
//!
//! HTTP surface for publishing the latest canary and accepting new ones.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod handler;

pub use api::{ApiServer, ServerError, create_router};
pub use config::{ServerArgs, ServerConfig};
pub use error::ApiError;
pub use handler::AppState;
