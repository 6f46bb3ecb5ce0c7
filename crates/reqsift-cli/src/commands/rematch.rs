//! Rematch command implementation.

use super::build_extractor;
use crate::cli::RematchArgs;
use crate::config::Config;
use crate::error::Result;
use crate::loader::load_document;
use crate::output::Formatter;
use crate::session::FileSessionStore;
use reqsift_domain::ExtractionSession;
use std::path::PathBuf;

/// Execute the rematch command.
///
/// The session is updated in place with the records found.
pub async fn execute_rematch(args: RematchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = FileSessionStore::new(Config::sessions_dir()?);
    let session = store.read(&args.session)?;

    let file = args
        .file
        .unwrap_or_else(|| PathBuf::from(&session.file_reference));
    let document = load_document(&file)?;
    let extractor = build_extractor(config, config.extractor.clone(), args.model)?;

    let result = extractor.rematch(&document, &session.requirements).await?;

    let added = &result.records[result.records.len() - result.added..];
    println!("{}", formatter.format_records(added)?);
    if !formatter.is_quiet() {
        eprintln!(
            "{}",
            formatter.success(&format!(
                "{} new requirement(s) after paragraph {}",
                result.added, result.resume_index
            ))
        );
    }

    if result.added > 0 {
        store.write(
            &args.session,
            &ExtractionSession::new(session.file_reference, result.records),
        )?;
    }
    Ok(())
}
