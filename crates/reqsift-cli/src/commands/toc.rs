//! Toc command implementation.

use crate::cli::TocArgs;
use crate::error::Result;
use crate::loader::load_document;
use crate::output::Formatter;
use reqsift_heuristic::parse_catalog_entries;

/// Execute the toc command.
pub fn execute_toc(args: TocArgs, formatter: &Formatter) -> Result<()> {
    let document = load_document(&args.file)?;
    let entries = parse_catalog_entries(document.paragraphs());

    println!("{}", formatter.format_toc(&entries)?);
    Ok(())
}
