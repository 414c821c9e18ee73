use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Vault operations that prefix the errors they raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Fetch,
    Publish,
    Pull,
    Push,
    Get,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Create => "Create",
            Op::Fetch => "Fetch",
            Op::Publish => "Publish",
            Op::Pull => "Pull",
            Op::Push => "Push",
            Op::Get => "Get",
        };
        f.write_str(name)
    }
}

/// Coarse error classes, independent of the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Io,
    Encoding,
    Crypto,
    NotFound,
    Pattern,
    Config,
}

/// All errors that can occur in Stash.
#[derive(Debug, Error)]
pub enum StashError {
    // --- Auth errors ---
    #[error("Incorrect passphrase")]
    AuthFailed,

    #[error("Passphrase cannot be empty")]
    EmptyPassphrase,

    #[error("No local vault yet — run `stash create` or `stash fetch` first")]
    NoLocalVault,

    // --- Crypto errors ---
    #[error("Failed to hash passphrase: {0}")]
    HashFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong passphrase or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    // --- Cache errors ---
    #[error("Local cache not found at {0}")]
    CacheMissing(PathBuf),

    #[error("Local cache {0} is locked by another stash process")]
    CacheLocked(PathBuf),

    // --- Remote store errors ---
    #[error("'{0}' not found in remote store")]
    RemoteNotFound(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Unsupported storage backend '{0}'")]
    UnsupportedBackend(String),

    // --- Lookup errors ---
    #[error("No key found matching '{0}'")]
    NotFound(String),

    #[error("Illegal pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    // --- Encoding errors ---
    #[error("Malformed data: {0}")]
    Encoding(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("[{op} failed] {source}")]
    Operation {
        op: Op,
        #[source]
        source: Box<StashError>,
    },
}

impl StashError {
    /// Classify this error, looking through operation prefixes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StashError::AuthFailed | StashError::EmptyPassphrase | StashError::NoLocalVault => {
                ErrorKind::Auth
            }
            StashError::HashFailed(_)
            | StashError::EncryptionFailed(_)
            | StashError::DecryptionFailed
            | StashError::KeyDerivationFailed(_)
            | StashError::InvalidEnvelope(_) => ErrorKind::Crypto,
            StashError::CacheMissing(_)
            | StashError::CacheLocked(_)
            | StashError::RemoteNotFound(_)
            | StashError::Remote(_)
            | StashError::Io(_) => ErrorKind::Io,
            StashError::NotFound(_) => ErrorKind::NotFound,
            StashError::Pattern { .. } => ErrorKind::Pattern,
            StashError::Encoding(_) => ErrorKind::Encoding,
            StashError::Config(_)
            | StashError::UnsupportedBackend(_)
            | StashError::CommandFailed(_) => ErrorKind::Config,
            StashError::Operation { source, .. } => source.kind(),
        }
    }

    /// The operation that raised this error, if it was prefixed.
    pub fn op(&self) -> Option<Op> {
        match self {
            StashError::Operation { op, .. } => Some(*op),
            _ => None,
        }
    }
}

/// Attach an operation prefix to an error result.
pub trait ResultExt<T> {
    fn during(self, op: Op) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn during(self, op: Op) -> Result<T> {
        self.map_err(|e| StashError::Operation {
            op,
            source: Box::new(e),
        })
    }
}

/// Convenience type alias for Stash results.
pub type Result<T> = std::result::Result<T, StashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_prefix_is_rendered() {
        let err: Result<()> = Err(StashError::DecryptionFailed);
        let err = err.during(Op::Pull).unwrap_err();
        assert!(err.to_string().starts_with("[Pull failed]"));
        assert_eq!(err.op(), Some(Op::Pull));
    }

    #[test]
    fn kind_looks_through_operation() {
        let err: Result<()> = Err(StashError::NotFound("zzz".into()));
        let err = err.during(Op::Get).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn kinds_match_taxonomy() {
        assert_eq!(StashError::AuthFailed.kind(), ErrorKind::Auth);
        assert_eq!(StashError::DecryptionFailed.kind(), ErrorKind::Crypto);
        assert_eq!(StashError::Encoding("x".into()).kind(), ErrorKind::Encoding);
        assert_eq!(
            StashError::Remote("offline".into()).kind(),
            ErrorKind::Io
        );
    }
}
