//! `stash get` — print one secret, or every secret whose key matches a regex.

use crate::cli::output;
use crate::cli::{Cli, Session};
use crate::errors::Result;
use crate::vault::Action;

/// Execute the `get` command.
pub fn execute(cli: &Cli, key: &str) -> Result<()> {
    let mut session = Session::open(cli, Action::Get)?;
    session.engine.pull()?;

    let matches = session.engine.get(key)?;
    if matches.is_exact() {
        for value in matches {
            output::value(&value);
        }
    } else {
        // Each pattern match is already a JSON object.
        let items: Vec<String> = matches.collect();
        output::value(&format!("[{}]", items.join(",")));
    }

    Ok(())
}
