//! Reqsift CLI library.
//!
//! This library provides the core functionality for the `reqsift` command-line
//! interface: configuration management, document loading, session files,
//! command execution, and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod provider;
pub mod session;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
