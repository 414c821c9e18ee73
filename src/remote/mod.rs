//! Remote stores — durable, named-blob storage behind a two-method contract.
//!
//! Backends carry no vault semantics: they move opaque bytes under a
//! name.  The engine only talks to `dyn RemoteStore`, so transport and
//! authentication details never leak into it.

pub mod file;
pub mod memory;

#[cfg(feature = "cloud-store")]
pub mod drive;

use std::fmt;
use std::str::FromStr;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::Settings;
use crate::errors::{Result, StashError};

/// Named-blob storage used by `create`, `fetch` and `publish`.
pub trait RemoteStore {
    /// Short backend name for logs (e.g. "file", "google").
    fn name(&self) -> &str;

    /// Read the object stored under `name`.
    ///
    /// Fails with `RemoteNotFound` if there is none.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Create or replace the object stored under `name`.
    fn write(&self, name: &str, data: &[u8]) -> Result<()>;
}

/// Which remote store to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    Google,
}

impl FromStr for Backend {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "file" | "local" => Ok(Backend::File),
            "google" | "gdrive" | "drive" => Ok(Backend::Google),
            other => Err(StashError::UnsupportedBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::File => f.write_str("file"),
            Backend::Google => f.write_str("google"),
        }
    }
}

/// Build the remote store for `backend` from the loaded settings.
pub fn connect(backend: Backend, settings: &Settings) -> Result<Box<dyn RemoteStore>> {
    match backend {
        Backend::File => Ok(Box::new(FileStore::new(settings.store_dir_path()))),
        #[cfg(feature = "cloud-store")]
        Backend::Google => Ok(Box::new(drive::DriveStore::new(settings.drive_config()?))),
        #[cfg(not(feature = "cloud-store"))]
        Backend::Google => Err(StashError::UnsupportedBackend(
            "google (this build has no cloud-store feature)".into(),
        )),
    }
}

/// Reject object names that could escape a store's namespace.
pub(crate) fn validate_object_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StashError::CommandFailed("vault name cannot be empty".into()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StashError::CommandFailed(format!(
            "vault name '{name}' is invalid — it must not contain path separators"
        )));
    }
    Ok(())
}
