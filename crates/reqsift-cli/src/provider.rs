//! Provider selection from the configuration.

use crate::config::{Config, ProviderKind};
use crate::error::{CliError, Result};
use reqsift_domain::traits::LlmProvider;
use reqsift_llm::{LlmError, MockProvider, OllamaProvider, OpenAiProvider};

/// Whichever provider the configuration selects.
pub enum ConfiguredProvider {
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// OpenAI-compatible endpoint
    OpenAi(OpenAiProvider),
    /// Scripted replies
    Mock(MockProvider),
}

impl ConfiguredProvider {
    /// Build the provider named by `config.provider`.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.provider {
            ProviderKind::Ollama => {
                let s = &config.ollama;
                Ok(Self::Ollama(
                    OllamaProvider::new(&s.endpoint, &s.model)
                        .with_temperature(s.temperature)
                        .with_max_tokens(s.max_tokens)
                        .with_timeout(config.extractor.request_timeout()),
                ))
            }
            ProviderKind::OpenAi => {
                let s = &config.openai;
                let key = config.openai_api_key().ok_or_else(|| {
                    CliError::Config(format!(
                        "No OpenAI API key. Set {} or openai.api_key in the config file",
                        crate::config::OPENAI_KEY_ENV
                    ))
                })?;
                Ok(Self::OpenAi(
                    OpenAiProvider::new(&s.base_url, key, &s.model)
                        .with_temperature(s.temperature)
                        .with_max_tokens(s.max_tokens)
                        .with_timeout(config.extractor.request_timeout()),
                ))
            }
            ProviderKind::Mock => Ok(Self::Mock(MockProvider::new(config.mock.response.clone()))),
        }
    }
}

impl LlmProvider for ConfiguredProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, model_hint: Option<&str>) -> std::result::Result<String, LlmError> {
        match self {
            Self::Ollama(p) => p.generate(prompt, model_hint),
            Self::OpenAi(p) => p.generate(prompt, model_hint),
            Self::Mock(p) => p.generate(prompt, model_hint),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Self::Ollama(p) => p.model_name(),
            Self::OpenAi(p) => p.model_name(),
            Self::Mock(p) => p.model_name(),
        }
    }
}
