//! Cryptographic primitives for Stash.
//!
//! This module provides:
//! - AES-256-GCM sealing under a raw key (`encryption`)
//! - Argon2id key derivation (`kdf`)
//! - HKDF sub-keys for wallet values (`keys`)
//! - The self-describing passphrase envelope (`envelope`)
//! - Passphrase hashing for the access gate (`passphrase`)

pub mod encryption;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod passphrase;

pub use envelope::{decrypt, encrypt, encrypt_with_params, Envelope};
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use passphrase::{hash_passphrase, verify_passphrase};
