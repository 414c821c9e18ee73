pub mod cache;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod remote;
pub mod vault;
