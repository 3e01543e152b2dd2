//! File-backed settings shared by the subcommands.
use murk_oracle::LlmConfig;
use murk_utils::errors::ObfuscateError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the LLM bearer token.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completions endpoint used by both oracles
    pub llm: LlmConfig,
    /// Theme the identifier oracle is asked to follow
    pub name_hint: String,
    /// Overall budget for the single naming request, in milliseconds
    pub name_timeout_ms: u64,
    /// Extra reserved names on top of the passes' estimates
    pub reserve_slack: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            name_hint: "user input handling".to_string(),
            name_timeout_ms: 30_000,
            reserve_slack: 16,
        }
    }
}

impl Config {
    /// Reads `path` if given, then takes the API key from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ObfuscateError> {
        let mut config = match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        if let Ok(key) = std::env::var(API_KEY_VAR) {
            config.llm.api_key = key;
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ObfuscateError> {
        let config: Self = serde_json::from_str(text)?;
        if config.llm.endpoint.trim().is_empty() {
            return Err(ObfuscateError::Config("llm.endpoint is empty".to_string()));
        }
        Ok(config)
    }

    /// True when the oracles can be reached at all.
    pub fn has_api_key(&self) -> bool {
        !self.llm.api_key.trim().is_empty()
    }
}
