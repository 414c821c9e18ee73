//! Configuration loaded from `.stash.toml`.

pub mod settings;

pub use settings::{DriveSettings, Settings};
