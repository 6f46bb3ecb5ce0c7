//! Document model - paragraphs and tables in source order

/// A table from the source document, as rows of cell text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Rows of cell text, in source order
    pub rows: Vec<Vec<String>>,

    /// Number of layout paragraphs that precede the table, when known
    pub position: Option<usize>,
}

impl Table {
    /// Create a table from its rows
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            position: None,
        }
    }

    /// Record where the table sits in the layout
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Text of the first row, cells joined with a single space
    pub fn first_row_text(&self) -> String {
        self.rows
            .first()
            .map(|row| row.join(" "))
            .unwrap_or_default()
    }
}

/// A loaded document.
///
/// Two paragraph views are kept:
/// - `layout`: every paragraph trimmed, blank ones included, so structural
///   cues like "an empty paragraph before a table" survive
/// - `paragraphs`: only the non-empty ones, which is what chunking, prompting
///   and rematching operate on
///
/// Both preserve source order. A document is immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    layout: Vec<String>,
    paragraphs: Vec<String>,
    tables: Vec<Table>,
}

impl Document {
    /// Build a document from raw paragraph text (blank entries allowed)
    ///
    /// # Examples
    ///
    /// ```
    /// use reqsift_domain::Document;
    ///
    /// let doc = Document::from_raw([" 3.2.1 Login ", "", "a) id"]);
    /// assert_eq!(doc.paragraphs(), &["3.2.1 Login".to_string(), "a) id".to_string()]);
    /// assert_eq!(doc.layout().len(), 3);
    /// ```
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let layout: Vec<String> = raw
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .collect();
        let paragraphs = layout.iter().filter(|p| !p.is_empty()).cloned().collect();
        Self {
            layout,
            paragraphs,
            tables: Vec::new(),
        }
    }

    /// Attach the document's tables
    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Non-empty paragraphs in source order
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// All paragraphs in source order, blank ones included
    pub fn layout(&self) -> &[String] {
        &self.layout
    }

    /// Tables in source order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Number of non-empty paragraphs
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// True when the document has no non-empty paragraph
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Total character count of the non-empty paragraphs
    pub fn char_len(&self) -> usize {
        self.paragraphs.iter().map(|p| p.chars().count()).sum()
    }
}
