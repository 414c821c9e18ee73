//! `stash create` — import a plaintext JSON document as a new vault.

use crate::cli::output;
use crate::cli::{required_name, Cli, Session};
use crate::errors::Result;
use crate::vault::Action;

/// Execute the `create` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let name = required_name(cli)?;
    let mut session = Session::open(cli, Action::Create)?;

    session.engine.create(name)?;

    output::success(&format!(
        "Created vault '{}' with {} secret(s)",
        name,
        session.engine.secrets().len()
    ));
    output::tip("The source document is still plaintext in the remote store; delete it if it holds live secrets.");

    Ok(())
}
