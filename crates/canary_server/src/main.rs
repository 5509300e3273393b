//! Canary Server
//!
//! Verifies submitted canaries and publishes the latest one.

#![warn(missing_docs)]
#![warn(clippy::all)]

use anyhow::{Context, Result};
use canary_server::{ApiServer, ServerArgs};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).context("invalid --log filter")?)
        .init();

    let server = ApiServer::new(args.into_config()).context("failed to start canary server")?;
    server.serve().await?;

    Ok(())
}
