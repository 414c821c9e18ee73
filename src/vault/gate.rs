//! Passphrase gate applied before a command touches the vault.

use super::engine::VaultEngine;
use crate::crypto::passphrase::verify_passphrase;
use crate::errors::{Result, StashError};

/// User-facing commands, as far as the gate is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Fetch,
    Publish,
    Get,
    Add,
    Delete,
}

impl Action {
    /// `create` and `fetch` replace the cache, so there is nothing to
    /// verify against (or the old hash no longer matters).
    pub fn requires_verification(self) -> bool {
        !matches!(self, Action::Create | Action::Fetch)
    }
}

/// Check `passphrase` for `action` against the engine's local cache.
///
/// Every action needs a non-empty passphrase.  Actions that read the
/// existing vault also need it to match the stored hash; a missing cache
/// is rejected as an auth failure.
pub fn authorize(action: Action, passphrase: &str, engine: &VaultEngine) -> Result<()> {
    if passphrase.is_empty() {
        return Err(StashError::EmptyPassphrase);
    }
    if !action.requires_verification() {
        return Ok(());
    }

    let stored = match engine.stored_hash() {
        Ok(hash) => hash,
        Err(StashError::CacheMissing(_)) => return Err(StashError::NoLocalVault),
        Err(e) => return Err(e),
    };

    if verify_passphrase(passphrase.as_bytes(), &stored) {
        tracing::debug!(?action, "passphrase verified");
        Ok(())
    } else {
        Err(StashError::AuthFailed)
    }
}
