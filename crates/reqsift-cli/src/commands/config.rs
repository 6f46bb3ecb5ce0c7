//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, config: &Config, path: Option<&Path>, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Init { force } => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => Config::path()?,
            };
            init_config(&path, force)?;
            println!("{}", formatter.success(&format!("Configuration written to {}", path.display())));
            Ok(())
        }
    }
}

/// Write the default configuration to `path`.
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists; use --force to overwrite",
            path.display()
        )));
    }
    Config::default().save_to(path)
}
