//! Reqsift Heuristic
//!
//! Finds a requirement's content from its title using layout cues alone:
//! section numbering, lettered parts like `a) 标识号`, labelled lines, blank
//! paragraphs before tables, and identifiers. No generation service is
//! involved, so it is fast, deterministic and works offline.
//!
//! The extractor provides:
//! - Three-tier title matching (whole name, section number, bare name)
//! - Boundary detection against the next requirement heading
//! - Table attachment and cross-requirement cleanup
//! - A validity gate that skips table of contents hits
//! - Table of contents parsing
//!
//! # Examples
//!
//! ```
//! use reqsift_heuristic::{BoundaryExtractor, HeuristicConfig};
//! use reqsift_domain::Document;
//!
//! let extractor = BoundaryExtractor::new(HeuristicConfig::permissive()).unwrap();
//! let document = Document::from_raw([
//!     "3.2.1 用户登录功能",
//!     "a) 标识号: REQ-1.1",
//!     "b) 说明: 用户通过账号和密码登录系统。",
//! ]);
//!
//! let outcome = extractor.locate(&document, "3.2.1 用户登录功能");
//! assert!(outcome.content().unwrap().contains("REQ-1.1"));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod locator;
mod toc;

pub use config::{HeuristicConfig, KeywordTable, PartKeywords, Thresholds};
pub use error::HeuristicError;
pub use locator::{BoundaryExtractor, LocateOutcome, Located, MatchTier};
pub use toc::{parse_catalog_entries, TocEntry};
