//! In-memory store.
//!
//! Useful for tests and for embedding the engine without touching disk.
//! Clones share the same objects, so a caller can keep a handle after
//! handing a boxed copy to the engine.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{validate_object_name, RemoteStore};
use crate::errors::{Result, StashError};

#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, e.g. the plaintext document for `create`.
    pub fn with_object(self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(name.to_string(), data.into());
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(name))
            .unwrap_or(false)
    }
}

impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        validate_object_name(name)?;
        let objects = self
            .objects
            .read()
            .map_err(|_| StashError::Remote("memory store lock poisoned".into()))?;
        objects
            .get(name)
            .cloned()
            .ok_or_else(|| StashError::RemoteNotFound(name.to_string()))
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_object_name(name)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StashError::Remote("memory store lock poisoned".into()))?;
        objects.insert(name.to_string(), data.to_vec());
        Ok(())
    }
}
