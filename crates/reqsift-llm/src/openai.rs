//! OpenAI-compatible chat completions provider
//!
//! Works against the official API and third-party gateways that speak the
//! same protocol (SiliconFlow, Zhipu, Qwen...). A base URL that already ends
//! in `/chat/completions` is accepted and trimmed back to its root.

use crate::ollama::DEFAULT_TIMEOUT_SECS;
use crate::runtime::{block_on, http_client};
use crate::LlmError;
use reqsift_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model name
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// System message sent ahead of every prompt
pub const SYSTEM_PROMPT: &str = "You are a professional requirements analyst, skilled at extracting \
structured requirement content from software requirement specifications.";

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider for `base_url` with the given key and model
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url: normalize_base_url(&base_url.into()),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout,
            client: http_client(timeout),
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set how long one HTTP request may run before it is abandoned
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = http_client(timeout);
        self
    }

    /// HTTP request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Key with everything but the first and last four characters masked
    pub fn masked_key(&self) -> String {
        let n = self.api_key.chars().count();
        if n <= 8 {
            return "****".to_string();
        }
        let head: String = self.api_key.chars().take(4).collect();
        let tail: String = self.api_key.chars().skip(n - 4).collect();
        format!("{}{}{}", head, "*".repeat(n - 8), tail)
    }

    /// Call `/chat/completions` and return the first choice's text
    pub async fn generate_async(&self, prompt: &str, model: &str) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Config("API key is not set".to_string()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            "Chat completion request: url={}, model={}, key={}, prompt length={}",
            url,
            model,
            self.masked_key(),
            prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status.as_u16(), error_text, model));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))
    }
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, model_hint: Option<&str>) -> Result<String, Self::Error> {
        let model = model_hint.unwrap_or(&self.model);
        block_on(self.generate_async(prompt, model))?
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let root = match trimmed.find("/chat/completions") {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    };
    if root.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        root.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(
            normalize_base_url("https://api.siliconflow.cn/v1/chat/completions"),
            "https://api.siliconflow.cn/v1"
        );
        assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com/v1");
        assert_eq!(normalize_base_url(""), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_masked_key() {
        let provider = OpenAiProvider::new(DEFAULT_BASE_URL, "sk-abcdefghijkl", DEFAULT_MODEL);
        assert_eq!(provider.masked_key(), "sk-a*******ijkl");

        let short = OpenAiProvider::new(DEFAULT_BASE_URL, "short", DEFAULT_MODEL);
        assert_eq!(short.masked_key(), "****");
    }

    #[test]
    fn test_missing_key_is_permanent() {
        let provider = OpenAiProvider::new(DEFAULT_BASE_URL, "", DEFAULT_MODEL);
        let result = provider.generate("hello", None);
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
            max_tokens: 100,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
    }
}
