//! Server configuration.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments for `canary-server`
#[derive(Debug, Parser)]
#[command(name = "canary-server")]
#[command(about = "Verifies and publishes a warrant canary chain", long_about = None)]
pub struct ServerArgs {
    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Directory accepted proofs are stored in
    #[arg(short, long, default_value = "canaries")]
    pub store_dir: PathBuf,

    /// File holding the trusted public key as hex
    #[arg(short = 'k', long)]
    pub public_key: PathBuf,

    /// Skip fsync on writes (testing only)
    #[arg(long)]
    pub no_fsync: bool,

    /// Log filter directives
    #[arg(long, default_value = "canary=info,tower_http=info")]
    pub log: String,
}

impl ServerArgs {
    /// Convert parsed arguments into a server configuration
    #[must_use]
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            store_dir: self.store_dir,
            public_key_file: self.public_key,
            fsync: !self.no_fsync,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,
    /// Directory accepted proofs are stored in
    pub store_dir: PathBuf,
    /// File holding the trusted public key as hex
    pub public_key_file: PathBuf,
    /// Flush writes to disk before acknowledging a submission
    pub fsync: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            store_dir: PathBuf::from("canaries"),
            public_key_file: PathBuf::from("canary.pub"),
            fsync: true,
        }
    }
}
