//! `stash fetch` — download a published vault into the local cache.

use crate::cli::output;
use crate::cli::{name_or_cached, Cli, Session};
use crate::errors::Result;
use crate::vault::Action;

/// Execute the `fetch` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut session = Session::open(cli, Action::Fetch)?;
    let name = name_or_cached(cli, &session.engine)?;

    session.engine.fetch(&name)?;

    output::success(&format!(
        "Fetched vault '{}' from {}",
        name,
        session.engine.remote().name()
    ));
    Ok(())
}
