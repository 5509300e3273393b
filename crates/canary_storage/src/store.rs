//! Append-only canary stores.

use canary_chain::{PersistError, PersistenceGateway};
use canary_core::{RawDocument, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

const FILE_PREFIX: &str = "canary-";
const FILE_SUFFIX: &str = ".proof";

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage directory
    pub dir: PathBuf,
    /// Flush files and directory to disk before reporting success
    pub fsync: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("canaries"),
            fsync: true,
        }
    }
}

/// Store error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A document is already stored under this deadline
    AlreadyExists { deadline: Timestamp },
    /// Simulated or backend-reported unavailability
    Unavailable { reason: String },
    /// IO error
    Io { path: PathBuf, reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists { deadline } => {
                write!(f, "Canary with deadline {} already stored", deadline)
            }
            Self::Unavailable { reason } => write!(f, "Store unavailable: {}", reason),
            Self::Io { path, reason } => write!(f, "IO error at {}: {}", path.display(), reason),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for PersistError {
    fn from(err: StoreError) -> Self {
        PersistError::new(err.to_string())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |e| StoreError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// One stored document with the deadline it was filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCanary {
    /// Deadline key
    pub deadline: Timestamp,
    /// Document exactly as accepted
    pub document: RawDocument,
}

/// Read access to every stored document, oldest deadline first
pub trait ChainArchive {
    /// Load the full stored history in deadline order
    ///
    /// # Errors
    ///
    /// Returns error if the history cannot be read
    fn load_all(&self) -> Result<Vec<StoredCanary>, StoreError>;

    /// Load the newest stored document
    ///
    /// # Errors
    ///
    /// Returns error if the history cannot be read
    fn load_latest(&self) -> Result<Option<StoredCanary>, StoreError> {
        Ok(self.load_all()?.pop())
    }
}

/// Filesystem store, one file per accepted canary
///
/// File names embed the zero-padded deadline so that lexical order is
/// deadline order.
#[derive(Debug)]
pub struct DirectoryStore {
    config: StoreConfig,
}

impl DirectoryStore {
    /// Open a store, creating its directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if directory creation fails
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.dir).map_err(io_error(&config.dir))?;
        info!(dir = %config.dir.display(), "Opened canary store");
        Ok(Self { config })
    }

    /// Storage directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// File name a deadline is stored under
    #[must_use]
    pub fn file_name(deadline: Timestamp) -> String {
        format!(
            "{}{:020}.{:09}{}",
            FILE_PREFIX, deadline.seconds, deadline.nanos, FILE_SUFFIX
        )
    }

    fn parse_file_name(name: &str) -> Option<Timestamp> {
        let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        let (seconds, nanos) = stem.split_once('.')?;
        if seconds.len() != 20 || nanos.len() != 9 {
            return None;
        }
        Some(Timestamp::new(seconds.parse().ok()?, nanos.parse().ok()?))
    }

    /// Durably write a document under its deadline
    ///
    /// # Errors
    ///
    /// Returns error if the deadline is taken or any write fails
    pub fn write(&self, document: &RawDocument, deadline: Timestamp) -> Result<PathBuf, StoreError> {
        let name = Self::file_name(deadline);
        let path = self.config.dir.join(&name);
        if path.exists() {
            return Err(StoreError::AlreadyExists { deadline });
        }

        // Linking fails if the target exists, even when another process
        // filed it after the check above.
        let tmp = self
            .config
            .dir
            .join(format!(".{}.{}.tmp", name, std::process::id()));
        let result = self.write_tmp(&tmp, document).and_then(|()| {
            fs::hard_link(&tmp, &path).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StoreError::AlreadyExists { deadline },
                _ => io_error(&path)(e),
            })
        });
        let _ = fs::remove_file(&tmp);
        result?;

        if self.config.fsync {
            Self::sync_dir(&self.config.dir)?;
        }
        debug!(path = %path.display(), "Wrote canary proof");
        Ok(path)
    }

    fn write_tmp(&self, tmp: &Path, document: &RawDocument) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp)
            .map_err(io_error(tmp))?;
        file.write_all(document.as_bytes()).map_err(io_error(tmp))?;
        if self.config.fsync {
            file.sync_all().map_err(io_error(tmp))?;
        }
        Ok(())
    }

    #[cfg(unix)]
    fn sync_dir(dir: &Path) -> Result<(), StoreError> {
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(io_error(dir))
    }

    #[cfg(not(unix))]
    fn sync_dir(_dir: &Path) -> Result<(), StoreError> {
        Ok(())
    }
}

impl ChainArchive for DirectoryStore {
    fn load_all(&self) -> Result<Vec<StoredCanary>, StoreError> {
        let dir = &self.config.dir;
        let mut entries = BTreeMap::new();
        for entry in fs::read_dir(dir).map_err(io_error(dir))? {
            let entry = entry.map_err(io_error(dir))?;
            let name = entry.file_name();
            let Some(deadline) = name.to_str().and_then(Self::parse_file_name) else {
                continue;
            };
            entries.insert(deadline, entry.path());
        }

        let mut canaries = Vec::with_capacity(entries.len());
        for (deadline, path) in entries {
            let text = fs::read_to_string(&path).map_err(io_error(&path))?;
            canaries.push(StoredCanary {
                deadline,
                document: RawDocument::new(text),
            });
        }
        Ok(canaries)
    }
}

impl PersistenceGateway for DirectoryStore {
    fn store(&self, document: &RawDocument, deadline: Timestamp) -> Result<(), PersistError> {
        self.write(document, deadline)?;
        Ok(())
    }
}

/// In-memory store
///
/// Can be switched to fail every write, which makes persistence failures
/// reproducible in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<Timestamp, RawDocument>>,
    failing: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, or succeed again
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a document under its deadline
    ///
    /// # Errors
    ///
    /// Returns error if failing is switched on or the deadline is taken
    pub fn write(&self, document: &RawDocument, deadline: Timestamp) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "writes disabled".to_string(),
            });
        }
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if documents.contains_key(&deadline) {
            return Err(StoreError::AlreadyExists { deadline });
        }
        documents.insert(deadline, document.clone());
        Ok(())
    }
}

impl ChainArchive for MemoryStore {
    fn load_all(&self) -> Result<Vec<StoredCanary>, StoreError> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .iter()
            .map(|(deadline, document)| StoredCanary {
                deadline: *deadline,
                document: document.clone(),
            })
            .collect())
    }
}

impl PersistenceGateway for MemoryStore {
    fn store(&self, document: &RawDocument, deadline: Timestamp) -> Result<(), PersistError> {
        self.write(document, deadline)?;
        Ok(())
    }
}
