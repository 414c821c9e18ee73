//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  Parameters come from `.stash.toml` (or defaults)
//! when sealing, and from the envelope header when opening.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::errors::{Result, StashError};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Upper bound on memory cost accepted from an envelope header (1 GB).
const MAX_MEMORY_KIB: u32 = 1_048_576;

/// Upper bound on iterations and lanes accepted from an envelope header.
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 64;

/// Configurable Argon2id parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// Reject parameters that are dangerously weak or absurdly expensive.
    ///
    /// The upper bounds matter when the parameters come from an untrusted
    /// header: a forged blob must not make us allocate gigabytes.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(StashError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(1..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(StashError::KeyDerivationFailed(format!(
                "Argon2 iterations must be between 1 and {MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(StashError::KeyDerivationFailed(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }

    /// Build the `argon2` crate parameter set.
    pub(crate) fn to_argon2(self, output_len: Option<usize>) -> Result<Params> {
        self.validate()?;
        Params::new(self.memory_kib, self.iterations, self.parallelism, output_len)
            .map_err(|e| StashError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))
    }
}

/// Derive a 32-byte key from a passphrase and salt.
///
/// The same passphrase + salt + params always produce the same key.
pub fn derive_key(passphrase: &[u8], salt: &[u8], params: &Argon2Params) -> Result<[u8; KEY_LEN]> {
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        params.to_argon2(Some(KEY_LEN))?,
    );

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| StashError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn same_inputs_same_key() {
        let salt = generate_salt();
        let a = derive_key(b"pw123", &salt, &fast()).unwrap();
        let b = derive_key(b"pw123", &salt, &fast()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_salts_different_keys() {
        let a = derive_key(b"pw123", &generate_salt(), &fast()).unwrap();
        let b = derive_key(b"pw123", &generate_salt(), &fast()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn weak_memory_rejected() {
        let params = Argon2Params {
            memory_kib: 1_024,
            ..fast()
        };
        assert!(derive_key(b"pw", &generate_salt(), &params).is_err());
    }

    #[test]
    fn oversized_params_rejected() {
        let params = Argon2Params {
            memory_kib: u32::MAX,
            ..fast()
        };
        assert!(params.validate().is_err());

        let params = Argon2Params {
            iterations: 0,
            ..fast()
        };
        assert!(params.validate().is_err());
    }
}
