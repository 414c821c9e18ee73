//! Sub-key derivation using HKDF-SHA256.
//!
//! From the Argon2id master key of a wallet we derive:
//! - one **per-value** key for each secret name (inner layer), and
//! - one **wallet** key for the encoded map as a whole (outer layer).

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use super::kdf::KEY_LEN;
use crate::errors::{Result, StashError};

/// Derive the key that seals one secret value.
///
/// `info` is `"stash-value:<name>"`, binding the key to the secret name
/// so that swapping two ciphertexts between keys fails authentication.
pub fn derive_value_key(master_key: &[u8], name: &str) -> Result<[u8; KEY_LEN]> {
    let info = format!("stash-value:{name}");
    hkdf_derive(master_key, info.as_bytes())
}

/// Derive the key that seals the encoded map.
pub fn derive_wallet_key(master_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(master_key, b"stash-wallet")
}

fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    // No extract salt: the master key is already uniformly random (Argon2id output).
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| StashError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// A 32-byte master key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn derive_value_key(&self, name: &str) -> Result<[u8; KEY_LEN]> {
        derive_value_key(&self.bytes, name)
    }

    pub fn derive_wallet_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_wallet_key(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_keys_differ_per_name() {
        let master = MasterKey::new([7u8; KEY_LEN]);
        let a = master.derive_value_key("alpha").unwrap();
        let b = master.derive_value_key("albeit").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, master.derive_value_key("alpha").unwrap());
    }

    #[test]
    fn wallet_key_is_distinct_from_value_keys() {
        let master = MasterKey::new([7u8; KEY_LEN]);
        let wallet = master.derive_wallet_key().unwrap();
        assert_ne!(wallet, master.derive_value_key("").unwrap());
        assert_ne!(&wallet, master.as_bytes());
    }
}
