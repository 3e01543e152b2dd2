use murk_utils::errors::OracleError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Bearer token; never written back out
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Model to use
    pub model: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_ms: 20_000,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Minimal chat-completions client shared by the name and fragment oracles.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OracleError::Http(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub const fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Sends one system + user exchange and returns the assistant's text.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, OracleError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "max_tokens": max_tokens,
            "temperature": self.config.temperature,
        });

        let resp: Value = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OracleError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| OracleError::InvalidResponse("missing message content".to_string()))?
            .trim()
            .to_string();
        if content.is_empty() {
            return Err(OracleError::InvalidResponse("empty completion".to_string()));
        }
        Ok(content)
    }
}
