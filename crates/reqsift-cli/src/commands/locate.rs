//! Locate command implementation.

use crate::cli::LocateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::loader::load_document;
use crate::output::Formatter;
use reqsift_heuristic::{parse_catalog_entries, BoundaryExtractor, HeuristicConfig};

/// Execute the locate command.
pub fn execute_locate(args: LocateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut names = args.names;
    if let Some(toc) = &args.toc {
        let catalog = load_document(toc)?;
        names.extend(parse_catalog_entries(catalog.paragraphs()).into_iter().map(|e| e.name));
    }
    if names.is_empty() {
        return Err(CliError::InvalidInput(
            "Give requirement names with --name or a table of contents with --toc".to_string(),
        ));
    }

    let heuristic = if args.permissive {
        HeuristicConfig {
            workers: config.heuristic.workers,
            keywords: config.heuristic.keywords.clone(),
            ..HeuristicConfig::permissive()
        }
    } else {
        config.heuristic.clone()
    };
    let document = load_document(&args.file)?;
    let extractor = BoundaryExtractor::new(heuristic)?;

    let results = extractor.locate_many(&document, &names)?;

    println!("{}", formatter.format_located(&results)?);
    if !formatter.is_quiet() {
        let found = results.iter().filter(|(_, o)| o.is_found()).count();
        eprintln!("{}", formatter.info(&format!("Located {}/{} requirement(s)", found, results.len())));
    }
    Ok(())
}
