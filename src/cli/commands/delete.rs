//! `stash delete` — remove a secret from the vault.

use crate::cli::output;
use crate::cli::{Cli, Session};
use crate::errors::Result;
use crate::vault::Action;

/// Execute the `delete` command.
///
/// Deleting a key that does not exist is not an error.
pub fn execute(cli: &Cli, key: &str) -> Result<()> {
    let mut session = Session::open(cli, Action::Delete)?;

    session.engine.pull()?;
    let existed = session.engine.delete(key);
    session.engine.push()?;

    if existed {
        output::success(&format!("Deleted secret '{key}'"));
    } else {
        output::info(&format!("No secret named '{key}'; nothing to delete."));
    }
    Ok(())
}
