use crate::provider::GenerationProvider;
use async_trait::async_trait;
use lore_core::{LoreError, LoreResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the OpenAI-compatible HTTP generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier sent in the request body.
    pub model_id: String,
    /// Bearer token.
    pub api_key: String,
    /// Base URL override; defaults to the OpenAI endpoint.
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    1024
}

impl GenerationConfig {
    /// Effective base URL for this backend.
    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or("https://api.openai.com")
    }
}

/// OpenAI-compatible HTTP generation backend.
///
/// Works with OpenAI, OpenRouter, Groq, Ollama, and any other provider
/// that implements the chat completions API.
pub struct HttpGeneration {
    config: GenerationConfig,
    http: reqwest::Client,
}

impl HttpGeneration {
    /// Create a backend with a fresh HTTP client.
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GenerationProvider for HttpGeneration {
    async fn invoke(&self, prompt: &str) -> LoreResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model = %self.config.model_id, "generation request");

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LoreError::Provider(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LoreError::Provider(e.to_string()))?;

        if !status.is_success() {
            return Err(LoreError::Provider(format!(
                "generation API error {status}: {resp_body}"
            )));
        }

        let content = resp_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                LoreError::Provider(format!("malformed completion response: {resp_body}"))
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_default_and_override() {
        let mut config = GenerationConfig {
            model_id: "gpt-4o-mini".to_string(),
            api_key: "k".to_string(),
            api_base_url: None,
            temperature: 0.2,
            max_tokens: 256,
        };
        assert_eq!(config.base_url(), "https://api.openai.com");

        config.api_base_url = Some("http://localhost:11434".to_string());
        assert_eq!(config.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"model_id":"m","api_key":"k","api_base_url":null}"#).unwrap();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 1024);
    }
}
