//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::cache::{CacheLock, LocalCache};
use crate::config::Settings;
use crate::errors::{Result, StashError};
use crate::remote::{self, Backend};
use crate::vault::{authorize, Action, VaultEngine};

/// Stash CLI: encrypted secrets vault with pluggable remote storage.
#[derive(Parser)]
#[command(
    name = "stash",
    about = "Encrypted secrets vault with pluggable remote storage",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Remote store: file or google (default from .stash.toml, else file)
    #[arg(short = 'c', long, env = "STASH_STORE", global = true)]
    pub connector: Option<String>,

    /// Vault name in the remote store
    #[arg(short, long, global = true)]
    pub name: Option<String>,

    /// Vault passphrase (prompted for if omitted)
    #[arg(
        short,
        long,
        env = "STASH_PASSPHRASE",
        hide_env_values = true,
        global = true
    )]
    pub passphrase: Option<String>,

    /// Local cache file (default: ~/.config/stash/cache.json)
    #[arg(long, env = "STASH_CACHE", global = true)]
    pub cache: Option<PathBuf>,

    /// Log engine phases to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Import a plaintext key/value JSON document from the remote store as a new vault
    Create,

    /// Download a published vault into the local cache
    Fetch,

    /// Upload the local vault to the remote store
    Publish,

    /// Print a secret, or every secret whose key matches a regex
    Get {
        /// Secret key or regex pattern
        #[arg(short, long)]
        key: String,
    },

    /// Add or update a secret
    Add {
        /// Secret key
        #[arg(short, long)]
        key: String,
        /// Secret value
        #[arg(short, long)]
        value: String,
    },

    /// Delete a secret
    Delete {
        /// Secret key
        #[arg(short, long)]
        key: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// An engine ready for one command: passphrase resolved, cache locked,
/// access checked.
pub struct Session {
    pub engine: VaultEngine,
    _lock: CacheLock,
}

impl Session {
    /// Build the engine for `action` from CLI flags and `.stash.toml`.
    ///
    /// The cache lock is taken before the access check and held until the
    /// session is dropped.
    pub fn open(cli: &Cli, action: Action) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;

        let cache = LocalCache::new(cache_path(cli, &settings)?);
        let backend: Backend = cli.connector.as_deref().unwrap_or(settings.store.as_str()).parse()?;
        let remote = remote::connect(backend, &settings)?;
        tracing::debug!(%backend, cache = %cache.path().display(), "opening session");

        let lock = cache.lock()?;
        let passphrase = resolve_passphrase(cli, action == Action::Create)?;
        let engine = VaultEngine::new(
            cache,
            remote,
            passphrase.clone(),
            settings.argon2_params(),
        );
        authorize(action, &passphrase, &engine)?;

        Ok(Self {
            engine,
            _lock: lock,
        })
    }
}

/// Resolve the cache path: `--cache` / `STASH_CACHE`, then settings.
pub fn cache_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    match &cli.cache {
        Some(path) => Ok(path.clone()),
        None => settings.cache_path(),
    }
}

/// Get the vault passphrase, trying in order:
/// 1. `--passphrase` / `STASH_PASSPHRASE`
/// 2. Interactive prompt (with confirmation when `confirm` is set)
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn resolve_passphrase(cli: &Cli, confirm: bool) -> Result<Zeroizing<String>> {
    if let Some(pw) = &cli.passphrase {
        return Ok(Zeroizing::new(pw.clone()));
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Vault passphrase");
    if confirm {
        prompt = prompt.with_confirmation(
            "Confirm vault passphrase",
            "Passphrases do not match, try again",
        );
    }
    let pw = prompt
        .interact()
        .map_err(|e| StashError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// The vault name from `--name`, required for commands without a fallback.
pub fn required_name(cli: &Cli) -> Result<&str> {
    cli.name
        .as_deref()
        .ok_or_else(|| StashError::CommandFailed("a vault name is required (--name)".into()))
}

/// The vault name from `--name`, else the name recorded in the local cache.
pub fn name_or_cached(cli: &Cli, engine: &VaultEngine) -> Result<String> {
    if let Some(name) = &cli.name {
        return Ok(name.clone());
    }
    match engine.cache().load() {
        Ok(record) if !record.name.is_empty() => Ok(record.name),
        Ok(_) | Err(StashError::CacheMissing(_)) => Err(StashError::CommandFailed(
            "a vault name is required (--name); the local cache has none".into(),
        )),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_global_flags() {
        let cli = Cli::try_parse_from([
            "stash", "add", "-k", "db", "-v", "postgres://x", "-n", "vault1", "-p", "pw",
        ])
        .unwrap();
        assert_eq!(cli.name.as_deref(), Some("vault1"));
        assert_eq!(cli.passphrase.as_deref(), Some("pw"));
        match cli.command {
            Commands::Add { key, value } => {
                assert_eq!(key, "db");
                assert_eq!(value, "postgres://x");
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn get_requires_key() {
        assert!(Cli::try_parse_from(["stash", "get"]).is_err());
    }

    #[test]
    fn connector_short_flag() {
        let cli = Cli::try_parse_from(["stash", "-c", "google", "fetch"]).unwrap();
        assert_eq!(cli.connector.as_deref(), Some("google"));
    }

    #[test]
    fn completions_shell_is_parsed_by_clap() {
        let cli = Cli::try_parse_from(["stash", "completions", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions {
                shell: clap_complete::Shell::Zsh
            }
        ));
        assert!(Cli::try_parse_from(["stash", "completions", "csh"]).is_err());
    }

    #[test]
    fn explicit_name_wins() {
        let cli = Cli::try_parse_from(["stash", "publish", "-n", "shared"]).unwrap();
        assert_eq!(required_name(&cli).unwrap(), "shared");
    }
}
