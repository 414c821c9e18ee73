//! `stash add` — add or update a secret in the vault.

use crate::cli::output;
use crate::cli::{Cli, Session};
use crate::errors::Result;
use crate::vault::Action;

/// Execute the `add` command.
pub fn execute(cli: &Cli, key: &str, value: &str) -> Result<()> {
    let mut session = Session::open(cli, Action::Add)?;

    session.engine.pull()?;
    let added = session.engine.add_or_update(key, value.as_bytes());
    session.engine.push()?;

    let verb = if added { "added" } else { "updated" };
    output::success(&format!(
        "Secret '{}' {} ({} total)",
        key,
        verb,
        session.engine.secrets().len()
    ));
    Ok(())
}
