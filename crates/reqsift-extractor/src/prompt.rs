//! Prompt templates for requirement extraction

/// Which template a prompt is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// First window, or no context carried yet
    Initial,
    /// Later window; resume after the last extracted requirement
    Continuation {
        /// Title (or section marker) extracted last
        last_title: String,
    },
    /// Look for one named requirement
    Specific {
        /// Requirement name searched for
        name: String,
    },
    /// Named search after part of the requirement was already found
    SpecificContinuation {
        /// Requirement name searched for
        name: String,
    },
    /// Remaining text after the last matched position
    Rematch,
    /// Table-of-contents extraction, first chunk
    Catalog {
        /// Minimum section depth that counts as a requirement
        requirement_level: usize,
    },
    /// Table-of-contents extraction, later chunks
    CatalogContinuation {
        /// Minimum section depth that counts as a requirement
        requirement_level: usize,
        /// 1-based chunk number
        chunk_number: usize,
    },
}

/// Builds prompts for the generation service
pub struct PromptBuilder {
    text: String,
    kind: PromptKind,
}

impl PromptBuilder {
    /// Create a new prompt builder for a chunk of document text
    pub fn new(text: impl Into<String>, kind: PromptKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Task
        match &self.kind {
            PromptKind::Initial => {
                prompt.push_str(EXTRACT_ALL_INSTRUCTIONS);
            }
            PromptKind::Continuation { last_title } => {
                prompt.push_str(EXTRACT_ALL_INSTRUCTIONS);
                prompt.push_str(&format!(
                    "\n\nThe previous part of the document was already processed; the last \
                     requirement extracted was \"{}\". Continue from there: if this text starts \
                     in the middle of that requirement, return its remaining content under the \
                     same title, then extract every requirement that follows. Do not restart \
                     from earlier requirements.",
                    last_title
                ));
            }
            PromptKind::Specific { name } => {
                prompt.push_str(&format!(
                    "Find the requirement named \"{}\" in the text below and extract its \
                     complete content, including every structural part.",
                    name
                ));
            }
            PromptKind::SpecificContinuation { name } => {
                prompt.push_str(&format!(
                    "Part of the requirement named \"{}\" was found in the previous text. The \
                     text below may continue it. Extract only the content that belongs to this \
                     requirement and continues it; stop at the next requirement heading.",
                    name
                ));
            }
            PromptKind::Rematch => {
                prompt.push_str(
                    "The earlier part of this document was already processed and some \
                     requirements were extracted. Identify and extract every remaining \
                     requirement section in the text below.",
                );
            }
            PromptKind::Catalog { requirement_level } => {
                prompt.push_str(&catalog_instructions(*requirement_level));
            }
            PromptKind::CatalogContinuation {
                requirement_level,
                chunk_number,
            } => {
                prompt.push_str(&catalog_instructions(*requirement_level));
                prompt.push_str(&format!(
                    "\n\nThis is chunk {} of a larger document. Earlier chunks were already \
                     processed; list only entries that appear in this chunk.",
                    chunk_number
                ));
            }
        }
        prompt.push_str("\n\n");

        // 2. Structure hint for requirement bodies
        if !self.is_catalog() {
            prompt.push_str(REQUIREMENT_STRUCTURE);
            prompt.push_str("\n\n");
        }

        // 3. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        // 4. Output format reminder
        prompt.push_str(match &self.kind {
            PromptKind::Specific { .. } | PromptKind::SpecificContinuation { .. } => {
                SPECIFIC_OUTPUT_FORMAT
            }
            PromptKind::Catalog { .. } | PromptKind::CatalogContinuation { .. } => {
                CATALOG_OUTPUT_FORMAT
            }
            _ => REQUIREMENTS_OUTPUT_FORMAT,
        });

        prompt
    }

    fn is_catalog(&self) -> bool {
        matches!(
            self.kind,
            PromptKind::Catalog { .. } | PromptKind::CatalogContinuation { .. }
        )
    }
}

fn catalog_instructions(requirement_level: usize) -> String {
    format!(
        "Extract the table of contents of this software requirements specification. List \
         every section whose number has at least {} levels (for example \"3.2.1\" has 3 \
         levels); these are the individual requirements. Keep section numbers exactly as \
         written and give each entry's name without its number.",
        requirement_level
    )
}

const EXTRACT_ALL_INSTRUCTIONS: &str = "Identify and extract every requirement section in \
the following part of a software requirements specification. A requirement section starts \
with a numbered heading (for example \"3.2.1 User login\") and ends where the next \
requirement heading begins. Copy the content verbatim; do not summarize.";

const REQUIREMENT_STRUCTURE: &str = r#"A requirement usually contains these parts:
a) 标识号 / Identifier, e.g. REQ-1.1
b) 说明 / Description
c) 进入条件 / Entry condition
d) 输入 / Input
e) 输出 / Output
f) 处理 / Processing
g) 性能 / Performance
h) 约束与限制 / Constraints"#;

const REQUIREMENTS_OUTPUT_FORMAT: &str = r#"Output format (JSON only):
```json
{
  "requirements": [
    {
      "chapter_number": "3.2.1",
      "title": "requirement title",
      "identifier": "REQ-1.1",
      "content": "full requirement content, all parts included"
    }
  ]
}
```

If the text contains no requirement, return an empty "requirements" array but keep the JSON complete."#;

const SPECIFIC_OUTPUT_FORMAT: &str = r#"Output format (JSON only):
```json
{
  "requirement": {
    "chapter_number": "3.2.1",
    "title": "requirement title",
    "identifier": "REQ-1.1",
    "content": "full requirement content"
  }
}
```

If the requirement does not appear in this text, return {"requirement": null}."#;

const CATALOG_OUTPUT_FORMAT: &str = r#"Output format (JSON only):
```json
{
  "requirements": [
    { "chapter": "3.2.1", "name": "requirement name" }
  ]
}
```"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_prompt_includes_text() {
        let prompt = PromptBuilder::new("3.2.1 Login\nbody", PromptKind::Initial).build();
        assert!(prompt.contains("3.2.1 Login\nbody"));
        assert!(prompt.contains("\"requirements\""));
        assert!(prompt.contains("进入条件"));
        assert!(!prompt.contains("Continue from there"));
    }

    #[test]
    fn test_continuation_prompt_names_last_title() {
        let prompt = PromptBuilder::new(
            "chunk",
            PromptKind::Continuation {
                last_title: "User login".into(),
            },
        )
        .build();
        assert!(prompt.contains("\"User login\""));
        assert!(prompt.contains("Continue from there"));
    }

    #[test]
    fn test_specific_prompts_use_single_object_shape() {
        for kind in [
            PromptKind::Specific { name: "Export".into() },
            PromptKind::SpecificContinuation { name: "Export".into() },
        ] {
            let prompt = PromptBuilder::new("chunk", kind).build();
            assert!(prompt.contains("\"Export\""));
            assert!(prompt.contains("\"requirement\": {"));
        }
    }

    #[test]
    fn test_catalog_prompt() {
        let prompt = PromptBuilder::new(
            "toc",
            PromptKind::CatalogContinuation {
                requirement_level: 3,
                chunk_number: 2,
            },
        )
        .build();
        assert!(prompt.contains("at least 3 levels"));
        assert!(prompt.contains("chunk 2"));
        assert!(prompt.contains("\"chapter\""));
        assert!(!prompt.contains("进入条件"));
    }

    #[test]
    fn test_rematch_prompt() {
        let prompt = PromptBuilder::new("rest of doc", PromptKind::Rematch).build();
        assert!(prompt.contains("remaining"));
        assert!(prompt.contains("rest of doc"));
    }
}
