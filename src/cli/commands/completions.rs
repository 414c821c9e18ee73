//! `stash completions` — print a shell completion script to stdout.
//!
//!   stash completions bash > ~/.bash_completion.d/stash

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    tracing::debug!(%shell, "generating completions");
    generate(shell, &mut cmd, bin, &mut io::stdout());
    Ok(())
}
