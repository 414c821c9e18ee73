//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod completions;
pub mod create;
pub mod delete;
pub mod fetch;
pub mod get;
pub mod publish;
