//! The decrypted key/value map held while a vault is unlocked.
//!
//! Values are opaque bytes wrapped in `Zeroizing` so they are wiped when
//! the map is dropped or an entry is overwritten.  Keys are kept sorted
//! so lookups and listings come out in a stable order.

use std::collections::BTreeMap;

use serde_json::Value;
use zeroize::Zeroizing;

use crate::errors::{Result, StashError};

/// Secret key -> plaintext value.
#[derive(Default, Clone)]
pub struct SecretMap {
    entries: BTreeMap<String, Zeroizing<Vec<u8>>>,
}

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a flat JSON object of plaintext values.
    ///
    /// String values are stored as their contents; any other JSON value
    /// is stored as its compact JSON text.  Anything other than a JSON
    /// object is an encoding error.
    pub fn from_json_document(raw: &[u8]) -> Result<Self> {
        let doc: Value = serde_json::from_slice(raw)
            .map_err(|e| StashError::Encoding(format!("data not in correct format: {e}")))?;

        let Value::Object(object) = doc else {
            return Err(StashError::Encoding(
                "data must be a flat JSON object of key/value pairs".into(),
            ));
        };

        let mut map = Self::new();
        for (key, value) in object {
            let bytes = match value {
                Value::String(s) => s.into_bytes(),
                other => other.to_string().into_bytes(),
            };
            map.insert(key, bytes);
        }
        Ok(map)
    }

    /// Insert or overwrite a value.  Returns `true` if the key was new.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> bool {
        self.entries
            .insert(key.into(), Zeroizing::new(value.into()))
            .is_none()
    }

    /// Remove a value.  Returns `true` if the key was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// Values never reach Debug output.
impl std::fmt::Debug for SecretMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl PartialEq for SecretMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for SecretMap {}
