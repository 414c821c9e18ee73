//! Vault module — the in-memory secret map and what moves it around.
//!
//! - `SecretMap`, the decrypted key/value map (`secret`)
//! - Two-layer wallet encryption of a map (`wallet`)
//! - `VaultEngine`, the create/fetch/publish/pull/push/CRUD surface (`engine`)
//! - The passphrase gate run before each command (`gate`)

pub mod engine;
pub mod gate;
pub mod secret;
pub mod wallet;

pub use engine::{EngineState, Matches, VaultEngine};
pub use gate::{authorize, Action};
pub use secret::SecretMap;
