//! Named command implementation.

use super::build_extractor;
use crate::cli::NamedArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::loader::{load_document, load_names};
use crate::output::Formatter;

/// Execute the named command.
pub async fn execute_named(args: NamedArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut names = args.names;
    if let Some(path) = &args.names_file {
        names.extend(load_names(path)?);
    }
    if names.is_empty() {
        return Err(CliError::InvalidInput("No requirement names given".to_string()));
    }

    let document = load_document(&args.file)?;
    let extractor = build_extractor(config, config.extractor.clone(), args.model)?;

    let found = extractor.extract_named(&document, &names).await?;

    println!("{}", formatter.format_named(&found)?);
    if !formatter.is_quiet() {
        let missing: Vec<&str> = names
            .iter()
            .filter(|name| !found.iter().any(|f| &f.name == *name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            eprintln!("{}", formatter.warning(&format!("Not found: {}", missing.join(", "))));
        }
    }

    Ok(())
}
