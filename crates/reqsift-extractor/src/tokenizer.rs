//! Model-unit estimation used to size windows
//!
//! Estimates are only used for budget arithmetic. They are deterministic for
//! a given text and never fail: when no encoding can be loaded the estimate
//! degrades to a character heuristic.

use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};
use tracing::{debug, warn};

/// Estimates how many model units a string costs
pub trait UnitEstimator: Send + Sync {
    /// Cost of `text` in model units
    fn estimate(&self, text: &str) -> usize;

    /// Longest prefix of `text` that fits in `max_units`
    fn truncate(&self, text: &str, max_units: usize) -> String;
}

/// Estimator backed by a tiktoken BPE encoding
///
/// Encoding lookup order: the model's own encoding, then `cl100k_base`,
/// then a four-characters-per-unit approximation.
pub struct TiktokenEstimator {
    bpe: Option<CoreBPE>,
}

impl TiktokenEstimator {
    /// Create an estimator for `model` (e.g. "gpt-3.5-turbo")
    pub fn new(model: &str) -> Self {
        let lower = model.to_ascii_lowercase();
        let bpe = match get_bpe_from_model(&lower) {
            Ok(bpe) => Some(bpe),
            Err(_) => {
                debug!("No encoding registered for model '{}', using cl100k_base", model);
                match cl100k_base() {
                    Ok(bpe) => Some(bpe),
                    Err(e) => {
                        warn!("Failed to load cl100k_base ({}), falling back to character estimate", e);
                        None
                    }
                }
            }
        };
        Self { bpe }
    }

    /// True when a real encoding is loaded
    pub fn has_encoding(&self) -> bool {
        self.bpe.is_some()
    }
}

impl UnitEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => approximate_units(text),
        }
    }

    fn truncate(&self, text: &str, max_units: usize) -> String {
        let Some(bpe) = &self.bpe else {
            return truncate_chars(text, max_units.saturating_mul(4));
        };

        let ids = bpe.encode_ordinary(text);
        if ids.len() <= max_units {
            return text.to_string();
        }

        // A cut can land inside a multi-byte character; back off until it decodes.
        let mut cut = max_units;
        while cut > 0 {
            if let Ok(decoded) = bpe.decode(ids[..cut].to_vec()) {
                return decoded;
            }
            cut -= 1;
        }
        String::new()
    }
}

/// Estimator counting one unit per character
///
/// Used for character-budgeted paths and for deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimator;

impl UnitEstimator for CharEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn truncate(&self, text: &str, max_units: usize) -> String {
        truncate_chars(text, max_units)
    }
}

fn approximate_units(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_estimator_counts_chars() {
        let est = CharEstimator;
        assert_eq!(est.estimate("需求abc"), 5);
        assert_eq!(est.truncate("需求abc", 3), "需求a");
        assert_eq!(est.truncate("ab", 10), "ab");
    }

    #[test]
    fn test_tiktoken_estimator_is_deterministic() {
        let est = TiktokenEstimator::new("gpt-3.5-turbo");
        let text = "3.2.1 User login\nThe system shall authenticate users.";
        assert_eq!(est.estimate(text), est.estimate(text));
        assert!(est.estimate(text) > 0);
        assert_eq!(est.estimate(""), 0);
    }

    #[test]
    fn test_unknown_model_still_estimates() {
        let est = TiktokenEstimator::new("no-such-model");
        assert!(est.estimate("hello world") > 0);
    }

    #[test]
    fn test_tiktoken_truncate_fits_budget() {
        let est = TiktokenEstimator::new("gpt-3.5-turbo");
        let text = "word ".repeat(200);
        let cut = est.truncate(&text, 50);
        assert!(est.estimate(&cut) <= 50);
        assert!(text.starts_with(&cut));

        let cjk = "需求说明进入条件输入输出处理性能约束".repeat(20);
        let cut = est.truncate(&cjk, 17);
        assert!(cjk.starts_with(&cut));
    }

    #[test]
    fn test_approximate_units() {
        assert_eq!(approximate_units(""), 0);
        assert_eq!(approximate_units("abcd"), 1);
        assert_eq!(approximate_units("abcde"), 2);
    }
}
