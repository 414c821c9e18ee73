use clap::Parser;
use stash::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Create => stash::cli::commands::create::execute(&cli),
        Commands::Fetch => stash::cli::commands::fetch::execute(&cli),
        Commands::Publish => stash::cli::commands::publish::execute(&cli),
        Commands::Get { ref key } => stash::cli::commands::get::execute(&cli, key),
        Commands::Add { ref key, ref value } => {
            stash::cli::commands::add::execute(&cli, key, value)
        }
        Commands::Delete { ref key } => stash::cli::commands::delete::execute(&cli, key),
        Commands::Completions { shell } => stash::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        stash::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `STASH_LOG` (default `warn`); `--verbose` forces `debug`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("stash=debug")
    } else {
        EnvFilter::try_from_env("STASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        stash::cli::output::warning("logging already initialized");
    }
}
