//! Junk-fragment oracle: produces one benign callable definition as source text.
use crate::llm::LlmClient;
use async_trait::async_trait;
use murk_utils::errors::OracleError;

#[async_trait]
pub trait FragmentOracle: Send + Sync {
    /// Returns source text holding one side-effect-free function definition. The text may
    /// fail to parse; callers validate it before use.
    async fn generate_fragment(&self) -> Result<String, OracleError>;
}

#[derive(Debug, Clone)]
pub struct LlmFragmentOracle {
    client: LlmClient,
}

impl LlmFragmentOracle {
    pub const fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FragmentOracle for LlmFragmentOracle {
    async fn generate_fragment(&self) -> Result<String, OracleError> {
        let prompt = "Generate a single, complete, and syntactically valid Python function that \
                      could be part of a user input validation module. The function must include \
                      at least one comment and take at least one parameter. Return only the \
                      function code with no additional text, markdown, or explanations.";
        let reply = self
            .client
            .chat(
                "You are a helpful assistant that generates valid Python functions.",
                prompt,
                200,
            )
            .await?;
        let code = strip_code_fences(&reply);
        if code.is_empty() {
            return Err(OracleError::InvalidResponse("empty fragment".to_string()));
        }
        Ok(code)
    }
}

/// Removes Markdown code fences (```` ``` ```` or ```` ```python ````) wrapped around a reply.
pub fn strip_code_fences(reply: &str) -> String {
    reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
