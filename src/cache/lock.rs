//! Advisory lock guarding the local cache against concurrent invocations.
//!
//! The lock is an exclusive `flock` on a sibling `<cache>.lock` file.  It
//! is non-blocking: a second process gets `CacheLocked` instead of
//! waiting.  On non-Unix targets the guard is a no-op.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::errors::{Result, StashError};

/// Holds the cache lock until dropped.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Take the lock at `lock_path`, creating the file if needed.
    pub fn acquire(lock_path: &Path, cache_path: &Path) -> Result<Self> {
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;

            // SAFETY: the descriptor belongs to `file`, which outlives the call.
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::WouldBlock {
                    return Err(StashError::CacheLocked(cache_path.to_path_buf()));
                }
                return Err(StashError::Io(err));
            }
        }
        #[cfg(not(unix))]
        let _ = cache_path;

        tracing::debug!(lock = %lock_path.display(), "acquired cache lock");

        Ok(Self {
            file,
            path: lock_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // SAFETY: same descriptor as in `acquire`; closing would release it anyway.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
    }
}
