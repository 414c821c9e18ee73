//! Local cache — the persisted session record between invocations.
//!
//! Exactly one `CacheRecord` lives at the cache path.  Writes go through
//! a temp file + rename so a reader never sees a half-written record, and
//! callers that mutate the cache hold a `CacheLock` for the whole
//! invocation.

pub mod lock;
pub mod record;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use lock::CacheLock;
pub use record::CacheRecord;

use crate::errors::{Result, StashError};

/// Handle on the cache file at an injected path.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a record has been written.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Take the advisory lock for this cache.
    pub fn lock(&self) -> Result<CacheLock> {
        let mut lock_name = self.path.as_os_str().to_owned();
        lock_name.push(".lock");
        CacheLock::acquire(Path::new(&lock_name), &self.path)
    }

    /// Read and decode the current record.
    pub fn load(&self) -> Result<CacheRecord> {
        if !self.exists() {
            return Err(StashError::CacheMissing(self.path.clone()));
        }
        let raw = fs::read(&self.path)?;
        CacheRecord::from_json(&raw)
    }

    /// Replace the record **atomically**.
    ///
    /// Writes to a temp file in the same directory, created owner-only on
    /// Unix, then renames it over the cache path.
    pub fn store(&self, record: &CacheRecord) -> Result<()> {
        let raw = record.to_json()?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent)?;
        }
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        // A leftover temp file may carry looser permissions; start fresh.
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        file.write_all(&raw)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!(path = %self.path.display(), "wrote cache record");
        Ok(())
    }

    /// Replace only the wallet, keeping name and hash.
    pub fn replace_data(&self, data: Vec<u8>) -> Result<()> {
        let mut record = self.load()?;
        record.data = data;
        self.store(&record)
    }
}
