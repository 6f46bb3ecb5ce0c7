//! Extract command implementation.

use super::build_extractor;
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::loader::load_document;
use crate::output::Formatter;
use crate::session::FileSessionStore;
use reqsift_domain::ExtractionSession;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let document = load_document(&args.file)?;

    let mut extractor_config = config.extractor.clone();
    if !args.prefixes.is_empty() {
        extractor_config.section_prefixes = args.prefixes;
    }
    let extractor = build_extractor(config, extractor_config, args.model)?;

    let result = extractor.extract_all(&document).await?;

    println!("{}", formatter.format_records(&result.records)?);
    if !formatter.is_quiet() {
        for failure in &result.failures {
            eprintln!(
                "{}",
                formatter.warning(&format!(
                    "Chunk {} (paragraphs {}..{}) skipped: {}",
                    failure.chunk_index + 1,
                    failure.paragraphs.0,
                    failure.paragraphs.1,
                    failure.reason
                ))
            );
        }
        eprintln!(
            "{}",
            formatter.run_summary(&result.metadata, result.records.len(), result.failures.len())
        );
    }

    if args.save_session {
        let store = FileSessionStore::new(Config::sessions_dir()?);
        let session = ExtractionSession::new(args.file.display().to_string(), result.records);
        let id = store.save(&session)?;
        eprintln!("{}", formatter.info(&format!("Session saved: {}", id)));
    }

    Ok(())
}
