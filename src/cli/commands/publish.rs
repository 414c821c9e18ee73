//! `stash publish` — upload the local vault to the remote store.

use crate::cli::output;
use crate::cli::{name_or_cached, Cli, Session};
use crate::errors::Result;
use crate::vault::Action;

/// Execute the `publish` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut session = Session::open(cli, Action::Publish)?;
    let name = name_or_cached(cli, &session.engine)?;

    session.engine.publish(&name)?;

    output::success(&format!(
        "Published vault '{}' to {}",
        name,
        session.engine.remote().name()
    ));
    Ok(())
}
