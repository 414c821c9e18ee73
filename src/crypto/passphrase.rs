//! One-way passphrase hashing for the access gate.
//!
//! The stored hash is an Argon2id PHC string
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`), so verification
//! reads its cost and salt from the hash itself.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use super::kdf::Argon2Params;
use crate::errors::{Result, StashError};

/// Hash `passphrase` for storage, using a fresh random salt.
pub fn hash_passphrase(passphrase: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        params
            .to_argon2(None)
            .map_err(|e| StashError::HashFailed(e.to_string()))?,
    );
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(passphrase, &salt)
        .map_err(|e| StashError::HashFailed(e.to_string()))?;

    Ok(hash.to_string().into_bytes())
}

/// Check `passphrase` against a stored hash.
///
/// Returns `false` on mismatch and on any malformed hash; never errors.
pub fn verify_passphrase(passphrase: &[u8], stored: &[u8]) -> bool {
    let Ok(encoded) = std::str::from_utf8(stored) else {
        return false;
    };
    let Ok(parsed) = PasswordHash::new(encoded) else {
        return false;
    };
    // The cost comes from the stored record, which `fetch` takes as is.
    let Ok(cost) = Params::try_from(&parsed) else {
        return false;
    };
    let bounded = Argon2Params {
        memory_kib: cost.m_cost(),
        iterations: cost.t_cost(),
        parallelism: cost.p_cost(),
    };
    if bounded.validate().is_err() {
        tracing::warn!("stored passphrase hash has an out-of-range Argon2 cost");
        return false;
    }
    // The digest comparison inside verify_password is constant-time.
    Argon2::default()
        .verify_password(passphrase, &parsed)
        .is_ok()
}
