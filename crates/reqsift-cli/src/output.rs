//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::session::StoredRecord;
use colored::*;
use reqsift_domain::RequirementRecord;
use reqsift_extractor::{CatalogEntry, ExtractionMetadata, NamedRequirement};
use reqsift_heuristic::{LocateOutcome, TocEntry};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Characters of content shown in a table cell
const PREVIEW_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format extracted records.
    pub fn format_records(&self, records: &[RequirementRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let stored: Vec<StoredRecord> = records.iter().map(StoredRecord::from).collect();
                Ok(serde_json::to_string_pretty(&stored)?)
            }
            OutputFormat::Quiet => Ok(join_lines(records.iter().map(|r| r.title.as_str()))),
            OutputFormat::Table => {
                if records.is_empty() {
                    return Ok(self.colorize("No requirements found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Chapter", "Title", "Identifier", "Content"]);
                for record in records {
                    builder.push_record([
                        record.chapter.as_deref().unwrap_or("-"),
                        record.title.as_str(),
                        record.identifier.as_deref().unwrap_or("-"),
                        preview(&record.content).as_str(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format named extraction results.
    pub fn format_named(&self, found: &[NamedRequirement]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(found)?),
            OutputFormat::Quiet => Ok(join_lines(found.iter().map(|n| n.name.as_str()))),
            OutputFormat::Table => {
                if found.is_empty() {
                    return Ok(self.colorize("No requirements found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Name", "Content"]);
                for item in found {
                    builder.push_record([item.name.clone(), preview(&item.content)]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format catalog entries.
    pub fn format_catalog(&self, entries: &[CatalogEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
            OutputFormat::Quiet => Ok(join_lines(
                entries.iter().map(|e| format!("{} {}", e.chapter, e.name)),
            )),
            OutputFormat::Table => {
                let rows = entries.iter().map(|e| [e.chapter.clone(), e.name.clone(), e.level.to_string()]);
                Ok(self.entry_table(rows))
            }
        }
    }

    /// Format parsed table of contents entries.
    pub fn format_toc(&self, entries: &[TocEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "chapter": e.chapter,
                            "name": e.name,
                            "level": e.level
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_lines(entries.iter().map(|e| e.name.as_str()))),
            OutputFormat::Table => {
                let rows = entries.iter().map(|e| [e.chapter.clone(), e.name.clone(), e.level.to_string()]);
                Ok(self.entry_table(rows))
            }
        }
    }

    /// Format heuristic locate results.
    pub fn format_located(&self, results: &[(String, LocateOutcome)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = results
                    .iter()
                    .map(|(name, outcome)| match outcome {
                        LocateOutcome::Found(located) => serde_json::json!({
                            "name": name,
                            "status": "found",
                            "paragraph": located.paragraph_index,
                            "tier": format!("{:?}", located.tier),
                            "parts": located.parts_found,
                            "tables": located.tables_attached,
                            "content": located.content
                        }),
                        LocateOutcome::NoContent { paragraph_index, tier } => serde_json::json!({
                            "name": name,
                            "status": "no_content",
                            "paragraph": paragraph_index,
                            "tier": format!("{:?}", tier)
                        }),
                        LocateOutcome::NotFound => serde_json::json!({
                            "name": name,
                            "status": "not_found"
                        }),
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_lines(
                results
                    .iter()
                    .filter(|(_, outcome)| outcome.is_found())
                    .map(|(name, _)| name.as_str()),
            )),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Name", "Status", "Tier", "Parts", "Content"]);
                for (name, outcome) in results {
                    let (status, tier, parts, content) = match outcome {
                        LocateOutcome::Found(located) => (
                            self.colorize("found", "green"),
                            format!("{:?}", located.tier),
                            located.parts_found.len().to_string(),
                            preview(&located.content),
                        ),
                        LocateOutcome::NoContent { tier, .. } => (
                            self.colorize("no content", "yellow"),
                            format!("{:?}", tier),
                            "-".to_string(),
                            String::new(),
                        ),
                        LocateOutcome::NotFound => (
                            self.colorize("not found", "red"),
                            "-".to_string(),
                            "-".to_string(),
                            String::new(),
                        ),
                    };
                    builder.push_record([name.clone(), status, tier, parts, content]);
                }
                Ok(render(builder))
            }
        }
    }

    /// One-line summary of an extraction run.
    pub fn run_summary(&self, metadata: &ExtractionMetadata, records: usize, failures: usize) -> String {
        let msg = format!(
            "{} requirement(s) from {}/{} chunk(s) in {} ms (model: {})",
            records,
            metadata.chunks_processed,
            metadata.chunks_total,
            metadata.processing_time_ms,
            metadata.model_name
        );
        if let Some(reason) = &metadata.aborted {
            self.error(&format!("Run aborted: {}. {}", reason, msg))
        } else if metadata.cancelled {
            self.warning(&format!("Run cancelled. {}", msg))
        } else if failures > 0 {
            self.warning(&format!("{}; {} chunk(s) skipped", msg, failures))
        } else {
            self.success(&msg)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Whether status lines should be printed at all.
    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    fn entry_table(&self, rows: impl Iterator<Item = [String; 3]>) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Chapter", "Name", "Level"]);
        let mut empty = true;
        for row in rows {
            builder.push_record(row);
            empty = false;
        }
        if empty {
            return self.colorize("No entries found.", "yellow");
        }
        render(builder)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn join_lines<S: AsRef<str>>(lines: impl Iterator<Item = S>) -> String {
    lines.map(|l| l.as_ref().to_string()).collect::<Vec<_>>().join("\n")
}

/// First line of `content`, cut to a readable width
fn preview(content: &str) -> String {
    let first = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if first.chars().count() > PREVIEW_CHARS {
        format!("{}…", first.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        first.to_string()
    }
}
