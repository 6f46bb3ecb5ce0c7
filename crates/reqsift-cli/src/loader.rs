//! Document loading.
//!
//! Two formats are read:
//! - `.json`: `{"paragraphs": [...], "tables": [...]}`, where a table is
//!   either plain rows (`[["cell", ...], ...]`) or
//!   `{"position": n, "rows": [...]}` with `n` the number of paragraphs
//!   before it
//! - anything else: plain text, one paragraph per line

use crate::error::{CliError, Result};
use reqsift_domain::{Document, Table};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
struct DocumentFile {
    paragraphs: Vec<String>,
    #[serde(default)]
    tables: Vec<TableFile>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableFile {
    Rows(Vec<Vec<String>>),
    Positioned {
        #[serde(default)]
        position: Option<usize>,
        rows: Vec<Vec<String>>,
    },
}

impl From<TableFile> for Table {
    fn from(file: TableFile) -> Self {
        match file {
            TableFile::Rows(rows) => Table::new(rows),
            TableFile::Positioned { position, rows } => Table { rows, position },
        }
    }
}

/// Load a document from `path`.
pub fn load_document(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CliError::Document(format!("Cannot read {}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let document = if is_json {
        parse_json(&contents)?
    } else {
        parse_text(&contents)
    };

    if document.is_empty() {
        return Err(CliError::Document(format!("{} has no text", path.display())));
    }
    debug!(
        "Loaded {} paragraphs and {} tables from {}",
        document.len(),
        document.tables().len(),
        path.display()
    );
    Ok(document)
}

/// Parse the JSON document format.
pub fn parse_json(contents: &str) -> Result<Document> {
    let file: DocumentFile = serde_json::from_str(contents)?;
    let tables = file.tables.into_iter().map(Table::from).collect();
    Ok(Document::from_raw(file.paragraphs).with_tables(tables))
}

/// Parse plain text, one paragraph per line. Blank lines are kept in the
/// layout view.
pub fn parse_text(contents: &str) -> Document {
    Document::from_raw(contents.lines())
}

/// Load a list of names, one per non-empty line.
pub fn load_names(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
