//! High-level vault operations used by CLI commands.
//!
//! `VaultEngine` owns the decrypted `SecretMap` and moves it between
//! three places:
//!
//! ```text
//!   RemoteStore  <-- create / fetch / publish -->  LocalCache
//!   LocalCache   <-- pull / push ---------------->  SecretMap (memory)
//! ```
//!
//! CRUD calls (`get`, `add_or_update`, `delete`) only touch memory.
//! Callers wrap mutations as `pull(); mutate; push()` and reads as
//! `pull(); get()`.

use regex::Regex;
use serde_json::Value;
use zeroize::Zeroizing;

use super::secret::SecretMap;
use super::wallet;
use crate::cache::{CacheRecord, LocalCache};
use crate::crypto::kdf::Argon2Params;
use crate::crypto::passphrase::hash_passphrase;
use crate::errors::{Op, Result, ResultExt, StashError};
use crate::remote::RemoteStore;

/// Whether the engine currently holds a decrypted map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Locked,
    Unlocked,
}

pub struct VaultEngine {
    cache: LocalCache,
    remote: Box<dyn RemoteStore>,
    passphrase: Zeroizing<String>,
    params: Argon2Params,
    secrets: SecretMap,
    state: EngineState,
}

impl VaultEngine {
    /// Build a locked engine.
    ///
    /// `params` is the Argon2 cost used for new wallets and hashes;
    /// existing wallets are opened with the cost recorded in them.
    pub fn new(
        cache: LocalCache,
        remote: Box<dyn RemoteStore>,
        passphrase: Zeroizing<String>,
        params: Argon2Params,
    ) -> Self {
        Self {
            cache,
            remote,
            passphrase,
            params,
            secrets: SecretMap::new(),
            state: EngineState::Locked,
        }
    }

    // ------------------------------------------------------------------
    // Remote synchronization
    // ------------------------------------------------------------------

    /// Import a plaintext key/value document from the remote store as a
    /// brand-new vault, replacing the local cache.
    ///
    /// This is the only operation that (re)generates the passphrase hash.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let (record, map) = self.build_new_vault(name).during(Op::Create)?;
        self.cache.store(&record).during(Op::Create)?;

        tracing::info!(vault = name, secrets = map.len(), "created vault");
        self.secrets = map;
        self.state = EngineState::Unlocked;
        Ok(())
    }

    fn build_new_vault(&self, name: &str) -> Result<(CacheRecord, SecretMap)> {
        tracing::debug!(vault = name, store = self.remote.name(), "reading source document");
        let raw = Zeroizing::new(self.remote.read(name)?);
        let map = SecretMap::from_json_document(&raw)?;

        tracing::debug!(secrets = map.len(), "sealing wallet");
        let data = wallet::seal(&map, self.passphrase.as_bytes(), &self.params)?;
        let hash = hash_passphrase(self.passphrase.as_bytes(), &self.params)?;

        let record = CacheRecord {
            name: name.to_string(),
            data,
            hash,
        };
        Ok((record, map))
    }

    /// Replace the local cache with a record published under `name`.
    ///
    /// The record is already encrypted, so nothing is decrypted here and
    /// the engine is left locked until the next `pull`.
    pub fn fetch(&mut self, name: &str) -> Result<()> {
        tracing::debug!(vault = name, store = self.remote.name(), "fetching record");
        let raw = self.remote.read(name).during(Op::Fetch)?;
        let record = CacheRecord::from_json(&raw).during(Op::Fetch)?;
        self.cache.store(&record).during(Op::Fetch)?;

        tracing::info!(vault = name, "fetched vault into local cache");
        self.secrets = SecretMap::new();
        self.state = EngineState::Locked;
        Ok(())
    }

    /// Rename the local record to `name` and publish it to the remote store.
    pub fn publish(&mut self, name: &str) -> Result<()> {
        let mut record = self.cache.load().during(Op::Publish)?;
        record.name = name.to_string();
        self.cache.store(&record).during(Op::Publish)?;

        let raw = record.to_json().during(Op::Publish)?;
        tracing::debug!(vault = name, store = self.remote.name(), "publishing record");
        self.remote.write(name, &raw).during(Op::Publish)?;

        tracing::info!(vault = name, "published vault");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local synchronization
    // ------------------------------------------------------------------

    /// Decrypt the cached wallet into memory.
    ///
    /// On failure the engine keeps whatever state it had before.
    pub fn pull(&mut self) -> Result<()> {
        let record = self.cache.load().during(Op::Pull)?;
        let map = wallet::open(&record.data, self.passphrase.as_bytes()).during(Op::Pull)?;

        tracing::debug!(secrets = map.len(), "pulled wallet");
        self.secrets = map;
        self.state = EngineState::Unlocked;
        Ok(())
    }

    /// Encrypt the in-memory map and replace the cached wallet.
    ///
    /// Only the local cache is touched.  Pushing a locked engine writes
    /// whatever it holds, which is an empty map unless something was added.
    pub fn push(&mut self) -> Result<()> {
        if self.state == EngineState::Locked {
            tracing::warn!("push without a preceding pull; writing the in-memory map as is");
        }

        let data =
            wallet::seal(&self.secrets, self.passphrase.as_bytes(), &self.params).during(Op::Push)?;
        self.cache.replace_data(data).during(Op::Push)?;

        tracing::debug!(secrets = self.secrets.len(), "pushed wallet");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Secret operations (memory only)
    // ------------------------------------------------------------------

    /// Look up secrets by exact key, falling back to a regex over keys.
    ///
    /// An exact hit yields the bare value.  Otherwise every entry whose
    /// lowercased key matches `pattern` yields a one-entry JSON object
    /// `{"<key>": <value>}`.  Values are produced lazily.
    pub fn get(&self, pattern: &str) -> Result<Matches<'_>> {
        if let Some(value) = self.secrets.get(pattern) {
            let value = String::from_utf8_lossy(value).into_owned();
            return Ok(Matches::new(true, std::iter::once(value)));
        }

        let regex = Regex::new(pattern)
            .map_err(|e| StashError::Pattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
            .during(Op::Get)?;

        if !self.secrets.keys().any(|k| regex.is_match(&k.to_lowercase())) {
            return Err(StashError::NotFound(pattern.to_string())).during(Op::Get);
        }

        let iter = self
            .secrets
            .iter()
            .filter(move |(key, _)| regex.is_match(&key.to_lowercase()))
            .map(|(key, value)| tagged(key, value));
        Ok(Matches::new(false, iter))
    }

    /// Insert or overwrite a secret.  Returns `true` if the key was new.
    ///
    /// Not persisted until `push`.
    pub fn add_or_update(&mut self, key: &str, value: impl Into<Vec<u8>>) -> bool {
        self.secrets.insert(key, value)
    }

    /// Remove a secret if present.  Returns `true` if it existed.
    ///
    /// Not persisted until `push`.
    pub fn delete(&mut self, key: &str) -> bool {
        self.secrets.remove(key)
    }

    /// The passphrase hash stored in the local cache.
    pub fn stored_hash(&self) -> Result<Vec<u8>> {
        Ok(self.cache.load()?.hash)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn secrets(&self) -> &SecretMap {
        &self.secrets
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }
}

/// Lazy sequence of formatted lookup results.
pub struct Matches<'a> {
    exact: bool,
    inner: Box<dyn Iterator<Item = String> + 'a>,
}

impl<'a> Matches<'a> {
    fn new(exact: bool, iter: impl Iterator<Item = String> + 'a) -> Self {
        Self {
            exact,
            inner: Box::new(iter),
        }
    }

    /// `true` for a single bare value found by exact key, `false` for
    /// `{"<key>": <value>}` objects found by pattern.
    pub fn is_exact(&self) -> bool {
        self.exact
    }
}

impl std::fmt::Debug for Matches<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matches")
            .field("exact", &self.exact)
            .finish_non_exhaustive()
    }
}

impl Iterator for Matches<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }
}

/// Render one pattern match as `{"<key>": <value>}`.
///
/// The value is embedded as JSON when it parses as JSON, otherwise as a
/// JSON string, so the result is always valid JSON.
fn tagged(key: &str, value: &[u8]) -> String {
    let value = serde_json::from_slice::<Value>(value)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(value).into_owned()));
    let mut object = serde_json::Map::with_capacity(1);
    object.insert(key.to_string(), value);
    Value::Object(object).to_string()
}
