//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use reqsift_extractor::ExtractorConfig;
use reqsift_heuristic::HeuristicConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured OpenAI key
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation provider used by the AI commands
    #[serde(default)]
    pub provider: ProviderKind,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Local Ollama settings
    #[serde(default)]
    pub ollama: OllamaSettings,

    /// OpenAI-compatible endpoint settings
    #[serde(default)]
    pub openai: OpenAiSettings,

    /// Scripted provider settings, for dry runs
    #[serde(default)]
    pub mock: MockSettings,

    /// AI extraction pipeline
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Heuristic boundary extractor
    #[serde(default)]
    pub heuristic: HeuristicConfig,
}

/// Which generation service to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
    /// Fixed reply, no network
    Mock,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Ollama connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    /// Server URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum generated tokens
    pub max_tokens: u32,
}

/// OpenAI-compatible connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API base URL
    pub base_url: String,
    /// API key; `OPENAI_API_KEY` takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum generated tokens
    pub max_tokens: u32,
}

/// Scripted provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSettings {
    /// Reply returned for every prompt
    pub response: String,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".reqsift").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default path.
    ///
    /// A missing file at the default path yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check the embedded pipeline sections.
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.heuristic.validate()?;
        Ok(())
    }

    /// The OpenAI key, environment first.
    pub fn openai_api_key(&self) -> Option<String> {
        resolve_api_key(std::env::var(OPENAI_KEY_ENV).ok(), self.openai.api_key.as_deref())
    }

    /// Directory holding saved sessions, next to the default config file.
    pub fn sessions_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".reqsift").join("sessions"))
    }
}

fn resolve_api_key(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| file.filter(|k| !k.trim().is_empty()).map(str::to_string))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen2.5:14b".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            response: r#"{"requirements": []}"#.to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
