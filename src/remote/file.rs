//! Local filesystem store: one file per object under a root directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{validate_object_name, RemoteStore};
use crate::errors::{Result, StashError};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        validate_object_name(name)?;
        Ok(self.root.join(name))
    }
}

impl RemoteStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.object_path(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StashError::RemoteNotFound(name.to_string()),
            _ => StashError::Remote(format!("could not read file {}: {e}", path.display())),
        })
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.object_path(name)?;
        if !self.root.as_os_str().is_empty() && !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        fs::write(&path, data)
            .map_err(|e| StashError::Remote(format!("could not write file {}: {e}", path.display())))
    }
}
