//! Wallet encoding: the two-layer encrypted form of a `SecretMap`.
//!
//! 1. Each value is sealed with AES-256-GCM under an HKDF sub-key bound
//!    to its secret name.
//! 2. The resulting `name -> base64(nonce || ciphertext)` map is encoded
//!    as JSON and sealed again under the wallet sub-key.
//! 3. The outer body is framed with the Argon2id envelope header, so the
//!    passphrase alone is enough to open the wallet.
//!
//! Both layers hang off one Argon2id derivation per seal/open, so the
//! cost of unlocking does not grow with the number of secrets.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::{Zeroize, Zeroizing};

use super::secret::SecretMap;
use crate::crypto::encryption::{seal as seal_bytes, unseal as unseal_bytes};
use crate::crypto::envelope::Envelope;
use crate::crypto::kdf::Argon2Params;
use crate::errors::{Result, StashError};

/// Encrypt `map` into a wallet blob under `passphrase`.
///
/// Any per-value failure aborts the whole seal: a wallet either holds
/// every secret or is not produced at all.
pub fn seal(map: &SecretMap, passphrase: &[u8], params: &Argon2Params) -> Result<Vec<u8>> {
    let envelope = Envelope::create(passphrase, params)?;

    let mut inner = BTreeMap::new();
    for (name, value) in map.iter() {
        let mut value_key = envelope.key().derive_value_key(name)?;
        let sealed = seal_bytes(&value_key, value);
        value_key.zeroize();

        let sealed = sealed.map_err(|e| {
            StashError::EncryptionFailed(format!("value of key '{name}': {e}"))
        })?;
        inner.insert(name, BASE64.encode(sealed));
    }

    let encoded = Zeroizing::new(
        serde_json::to_vec(&inner)
            .map_err(|e| StashError::Encoding(format!("wallet map: {e}")))?,
    );

    let mut wallet_key = envelope.key().derive_wallet_key()?;
    let body = seal_bytes(&wallet_key, &encoded);
    wallet_key.zeroize();

    Ok(envelope.frame(&body?))
}

/// Decrypt a wallet blob back into a `SecretMap`.
///
/// Fails if the outer layer or any single value fails to authenticate.
pub fn open(blob: &[u8], passphrase: &[u8]) -> Result<SecretMap> {
    let (envelope, body) = Envelope::unframe(blob, passphrase)?;

    let mut wallet_key = envelope.key().derive_wallet_key()?;
    let encoded = unseal_bytes(&wallet_key, body);
    wallet_key.zeroize();
    let encoded = Zeroizing::new(encoded?);

    let inner: BTreeMap<String, String> = serde_json::from_slice(&encoded)
        .map_err(|e| StashError::Encoding(format!("wallet map: {e}")))?;

    let mut map = SecretMap::new();
    for (name, sealed_b64) in inner {
        let sealed = BASE64.decode(&sealed_b64).map_err(|e| {
            StashError::Encoding(format!("value of key '{name}' is not base64: {e}"))
        })?;

        let mut value_key = envelope.key().derive_value_key(&name)?;
        let value = unseal_bytes(&value_key, &sealed);
        value_key.zeroize();

        map.insert(name, value?);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::envelope::HEADER_LEN;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn sample() -> SecretMap {
        let mut map = SecretMap::new();
        map.insert("alpha", "1");
        map.insert("albeit", "2");
        map.insert("beta", "3");
        map
    }

    #[test]
    fn seal_open_roundtrip() {
        let wallet = seal(&sample(), b"pw123", &fast()).unwrap();
        let map = open(&wallet, b"pw123").unwrap();
        assert_eq!(map, sample());
    }

    #[test]
    fn empty_map_roundtrip() {
        let wallet = seal(&SecretMap::new(), b"pw", &fast()).unwrap();
        assert!(open(&wallet, b"pw").unwrap().is_empty());
    }

    #[test]
    fn wrong_passphrase_fails() {
        let wallet = seal(&sample(), b"pw123", &fast()).unwrap();
        assert!(matches!(
            open(&wallet, b"nope").unwrap_err(),
            StashError::DecryptionFailed
        ));
    }

    #[test]
    fn flipped_body_byte_fails() {
        let mut wallet = seal(&sample(), b"pw", &fast()).unwrap();
        let last = wallet.len() - 1;
        wallet[last] ^= 0x01;
        assert!(open(&wallet, b"pw").is_err());

        let mut wallet = seal(&sample(), b"pw", &fast()).unwrap();
        wallet[HEADER_LEN + 20] ^= 0x80;
        assert!(open(&wallet, b"pw").is_err());
    }

    #[test]
    fn plaintext_values_do_not_appear_in_wallet() {
        let mut map = SecretMap::new();
        map.insert("token", "super-secret-token-value");
        let wallet = seal(&map, b"pw", &fast()).unwrap();
        let needle = b"super-secret-token-value";
        assert!(!wallet.windows(needle.len()).any(|w| w == needle));
    }
}
