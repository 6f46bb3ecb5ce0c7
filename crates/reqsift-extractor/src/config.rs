//! Configuration for the Extractor

use crate::error::ExtractorError;
use reqsift_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded retry settings for generation calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Cap for any single delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Build the runtime policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Window budget in model units
    pub window_units: usize,

    /// Overlap between consecutive windows in model units
    pub overlap_units: usize,

    /// Use overlapping windows and continuation prompts
    pub enable_context: bool,

    /// Candidates whose trimmed content is not longer than this are noise
    pub min_content_chars: usize,

    /// Budget for the remaining text sent in a rematch (model units)
    pub rematch_window_units: usize,

    /// Character budget per catalog chunk
    pub catalog_max_chars: usize,

    /// Character overlap between catalog chunks
    pub catalog_overlap_chars: usize,

    /// Minimum section depth kept by catalog extraction
    pub requirement_level: usize,

    /// Deadline for a single generation call (seconds)
    pub call_timeout_secs: u64,

    /// Keep only records whose chapter starts with one of these (empty = all)
    pub section_prefixes: Vec<String>,

    /// Model name used to pick the tokenizer encoding
    pub tokenizer_model: String,

    /// Retry policy for generation calls
    pub retry: RetryConfig,
}

impl ExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Timeout for the provider's own HTTP request
    ///
    /// One second under the per-call deadline, so a request the extractor
    /// stopped waiting for ends before its retry gets far.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.saturating_sub(1).max(1))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let invalid = |msg: &str| Err(ExtractorError::InvalidConfiguration(msg.to_string()));

        if self.window_units == 0 {
            return invalid("window_units must be greater than 0");
        }
        if self.overlap_units >= self.window_units {
            return invalid("overlap_units must be smaller than window_units");
        }
        if self.rematch_window_units == 0 {
            return invalid("rematch_window_units must be greater than 0");
        }
        if self.catalog_max_chars == 0 {
            return invalid("catalog_max_chars must be greater than 0");
        }
        if self.catalog_overlap_chars >= self.catalog_max_chars {
            return invalid("catalog_overlap_chars must be smaller than catalog_max_chars");
        }
        if self.requirement_level == 0 {
            return invalid("requirement_level must be at least 1");
        }
        if self.call_timeout_secs == 0 {
            return invalid("call_timeout_secs must be greater than 0");
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1");
        }
        if self.retry.multiplier < 1.0 {
            return invalid("retry.multiplier must be at least 1.0");
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return invalid("retry.initial_backoff_ms cannot exceed retry.max_backoff_ms");
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            window_units: 3_500,
            overlap_units: 500,
            enable_context: true,
            min_content_chars: 10,
            rematch_window_units: 3_000,
            catalog_max_chars: 100_000,
            catalog_overlap_chars: 10_000,
            requirement_level: 3,
            call_timeout_secs: 120,
            section_prefixes: Vec::new(),
            tokenizer_model: "gpt-3.5-turbo".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller windows, shorter timeouts, fewer retries
    pub fn aggressive() -> Self {
        Self {
            window_units: 2_000,
            overlap_units: 300,
            rematch_window_units: 2_000,
            catalog_max_chars: 50_000,
            catalog_overlap_chars: 5_000,
            call_timeout_secs: 60,
            retry: RetryConfig {
                max_attempts: 2,
                initial_backoff_ms: 1_000,
                max_backoff_ms: 5_000,
                multiplier: 2.0,
            },
            ..Self::default()
        }
    }

    /// Lenient preset: larger windows and overlap, longer timeouts
    pub fn lenient() -> Self {
        Self {
            window_units: 6_000,
            overlap_units: 1_000,
            rematch_window_units: 5_000,
            call_timeout_secs: 300,
            retry: RetryConfig {
                max_attempts: 5,
                ..RetryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Regression-dialect preset: only functional sections under 3.1 and 3.2
    pub fn regression() -> Self {
        Self {
            section_prefixes: vec!["3.1.".to_string(), "3.2.".to_string()],
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str).map_err(|e| {
            ExtractorError::InvalidConfiguration(format!("Failed to parse TOML: {}", e))
        })
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self).map_err(|e| {
            ExtractorError::InvalidConfiguration(format!("Failed to serialize to TOML: {}", e))
        })
    }
}
