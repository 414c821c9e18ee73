//! Passphrase envelope: Argon2id header + AES-256-GCM body.
//!
//! ```text
//! [STSH: 4][version: 1][memory_kib: 4 LE][iterations: 4 LE][parallelism: 4 LE][salt: 32][nonce: 12][ciphertext + tag]
//! ```
//!
//! The header carries everything needed to re-derive the key from the
//! passphrase, so a blob is self-describing.  The header is not fed to
//! GCM as associated data: every header field is an input to the key
//! derivation, so altering any of them yields a different key and the
//! tag check fails anyway.

use zeroize::Zeroize;

use super::encryption::{self, NONCE_LEN, TAG_LEN};
use super::kdf::{derive_key, generate_salt, Argon2Params, SALT_LEN};
use super::keys::MasterKey;
use crate::errors::{Result, StashError};

const MAGIC: &[u8; 4] = b"STSH";

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// 4 (magic) + 1 (version) + 12 (params) + 32 (salt).
pub const HEADER_LEN: usize = 4 + 1 + 12 + SALT_LEN;

/// A passphrase-derived key together with the header that reproduces it.
pub struct Envelope {
    params: Argon2Params,
    salt: [u8; SALT_LEN],
    key: MasterKey,
}

impl Envelope {
    /// Derive a key for a new blob under a freshly drawn salt.
    pub fn create(passphrase: &[u8], params: &Argon2Params) -> Result<Self> {
        let salt = generate_salt();
        let mut key_bytes = derive_key(passphrase, &salt, params)?;
        let key = MasterKey::new(key_bytes);
        key_bytes.zeroize();

        Ok(Self {
            params: *params,
            salt,
            key,
        })
    }

    /// Parse the header of `blob`, re-derive its key, and return the body.
    pub fn unframe<'a>(blob: &'a [u8], passphrase: &[u8]) -> Result<(Self, &'a [u8])> {
        if blob.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
            return Err(StashError::InvalidEnvelope("truncated input".into()));
        }
        if &blob[0..4] != MAGIC {
            return Err(StashError::InvalidEnvelope("missing STSH magic bytes".into()));
        }
        if blob[4] != ENVELOPE_VERSION {
            return Err(StashError::InvalidEnvelope(format!(
                "unsupported version {}, expected {ENVELOPE_VERSION}",
                blob[4]
            )));
        }

        let params = Argon2Params {
            memory_kib: read_u32(&blob[5..9])?,
            iterations: read_u32(&blob[9..13])?,
            parallelism: read_u32(&blob[13..17])?,
        };
        params.validate()?;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&blob[17..HEADER_LEN]);

        let mut key_bytes = derive_key(passphrase, &salt, &params)?;
        let key = MasterKey::new(key_bytes);
        key_bytes.zeroize();

        Ok((Self { params, salt, key }, &blob[HEADER_LEN..]))
    }

    /// Prepend this envelope's header to an already sealed body.
    pub fn frame(&self, body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(MAGIC);
        out.push(ENVELOPE_VERSION);
        out.extend_from_slice(&self.params.memory_kib.to_le_bytes());
        out.extend_from_slice(&self.params.iterations.to_le_bytes());
        out.extend_from_slice(&self.params.parallelism.to_le_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(body);
        out
    }

    pub fn key(&self) -> &MasterKey {
        &self.key
    }

    pub fn params(&self) -> &Argon2Params {
        &self.params
    }
}

fn read_u32(bytes: &[u8]) -> Result<u32> {
    let arr: [u8; 4] = bytes
        .try_into()
        .map_err(|_| StashError::InvalidEnvelope("bad parameter field".into()))?;
    Ok(u32::from_le_bytes(arr))
}

/// Encrypt `plaintext` under `passphrase` with the default Argon2 cost.
pub fn encrypt(plaintext: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_params(plaintext, passphrase, &Argon2Params::default())
}

/// Encrypt `plaintext` under `passphrase` with an explicit Argon2 cost.
pub fn encrypt_with_params(
    plaintext: &[u8],
    passphrase: &[u8],
    params: &Argon2Params,
) -> Result<Vec<u8>> {
    let envelope = Envelope::create(passphrase, params)?;
    let body = encryption::seal(envelope.key().as_bytes(), plaintext)?;
    Ok(envelope.frame(&body))
}

/// Decrypt a blob produced by `encrypt`.
///
/// Fails on truncation, unknown format, or authentication failure; never
/// returns unauthenticated bytes.
pub fn decrypt(blob: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    let (envelope, body) = Envelope::unframe(blob, passphrase)?;
    encryption::unseal(envelope.key().as_bytes(), body)
}
