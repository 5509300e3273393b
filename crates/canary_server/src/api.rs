//! API server

use axum::{
    Router,
    routing::{get, post},
};
use canary_chain::ChainGuard;
use canary_proof::{KeyError, PublicKey};
use canary_storage::{DirectoryStore, RecoveryError, StoreConfig, StoreError, recover};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::handler::{self, AppState};

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/key", get(handler::get_key))
        .route("/status", get(handler::status))
        .route("/latest", get(handler::latest))
        .route("/submit", post(handler::submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Server startup errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Key file could not be read
    #[error("Failed to read key file {path}: {reason}")]
    KeyFile { path: PathBuf, reason: String },

    /// Key file does not hold a valid key
    #[error("Invalid key in {path}: {source}")]
    Key { path: PathBuf, source: KeyError },

    /// Store could not be opened
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored chain is invalid
    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    /// Listener failure
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The canary publishing server
pub struct ApiServer {
    bind: String,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Load the key, open the store, and recover the chain tip
    ///
    /// # Errors
    ///
    /// Returns error if the key is unreadable or the stored chain is invalid
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let key = load_public_key(&config.public_key_file)?;
        let store = Arc::new(DirectoryStore::open(StoreConfig {
            dir: config.store_dir,
            fsync: config.fsync,
        })?);

        let tip = recover(store.as_ref(), &key)?;
        let guard = ChainGuard::restore(store, tip);
        info!(key = %key, populated = guard.is_populated(), "Canary chain ready");

        Ok(Self {
            bind: config.bind,
            state: Arc::new(AppState::new(guard, key)),
        })
    }

    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Bind and serve until the process is stopped
    ///
    /// # Errors
    ///
    /// Returns error if binding or serving fails
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(&self.bind).await?;
        info!(addr = %self.bind, "Canary server listening");
        axum::serve(listener, create_router(self.state)).await?;
        Ok(())
    }
}

fn load_public_key(path: &Path) -> Result<PublicKey, ServerError> {
    let text = std::fs::read_to_string(path).map_err(|e| ServerError::KeyFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    PublicKey::from_hex(&text).map_err(|source| ServerError::Key {
        path: path.to_path_buf(),
        source,
    })
}
