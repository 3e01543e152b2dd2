//! Identifier oracle and the adapter that makes it safe to depend on.
use crate::llm::LlmClient;
use async_trait::async_trait;
use indexmap::IndexSet;
use murk_core::ident::{is_valid_identifier, sanitize};
use murk_utils::errors::OracleError;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of plausible replacement identifiers.
///
/// Implementations may fail or return fewer (or unusable) names; [`NameGenerator`] repairs
/// whatever comes back.
#[async_trait]
pub trait IdentifierOracle: Send + Sync {
    async fn generate_names(&self, count: usize, hint: &str) -> Result<Vec<String>, OracleError>;
}

/// Asks a chat-completions model for names, one per line.
#[derive(Debug, Clone)]
pub struct LlmNameOracle {
    client: LlmClient,
}

impl LlmNameOracle {
    pub const fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentifierOracle for LlmNameOracle {
    async fn generate_names(&self, count: usize, hint: &str) -> Result<Vec<String>, OracleError> {
        let prompt = format!(
            "Generate {count} plausible variable names for a Python program related to {hint}, \
             one per line, with no additional text or formatting."
        );
        // Roughly four tokens per name plus headroom.
        let max_tokens = u32::try_from(count.saturating_mul(6) + 32).unwrap_or(u32::MAX);
        let reply = self
            .client
            .chat(
                "You are a helpful assistant that generates plausible Python variable names.",
                &prompt,
                max_tokens,
            )
            .await?;
        Ok(reply.lines().map(str::to_string).collect())
    }
}

/// Offline oracle producing one random letter followed by seven alphanumerics.
#[derive(Debug, Clone, Copy)]
pub struct RandomNameOracle {
    seed: u64,
}

impl RandomNameOracle {
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl IdentifierOracle for RandomNameOracle {
    async fn generate_names(&self, count: usize, _hint: &str) -> Result<Vec<String>, OracleError> {
        const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok((0..count)
            .map(|_| {
                let mut name = String::with_capacity(8);
                name.push(LETTERS[rng.random_range(0..LETTERS.len())] as char);
                name.extend((0..7).map(|_| rng.sample(Alphanumeric) as char));
                name
            })
            .collect())
    }
}

/// Oracle that always fails; every name then comes from the deterministic fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOracle;

#[async_trait]
impl IdentifierOracle for UnavailableOracle {
    async fn generate_names(&self, _count: usize, _hint: &str) -> Result<Vec<String>, OracleError> {
        Err(OracleError::Unavailable("no identifier oracle configured".to_string()))
    }
}

/// Adapter in front of an [`IdentifierOracle`].
///
/// Issues exactly one oracle call per request, bounded by `timeout`, sanitizes what comes
/// back and fabricates `var_{i}` names for any shortfall. A failed call is not retried.
#[derive(Clone)]
pub struct NameGenerator {
    oracle: Arc<dyn IdentifierOracle>,
    hint: String,
    timeout: Duration,
}

impl std::fmt::Debug for NameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameGenerator")
            .field("hint", &self.hint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl NameGenerator {
    pub fn new(oracle: Arc<dyn IdentifierOracle>) -> Self {
        Self {
            oracle,
            hint: "user input handling".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Generator that never calls out; useful offline and in tests.
    pub fn offline() -> Self {
        Self::new(Arc::new(UnavailableOracle))
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns exactly `n` distinct valid identifiers, none of them in `exclude`.
    pub async fn request(&self, n: usize, exclude: &IndexSet<String>) -> Vec<String> {
        if n == 0 {
            return Vec::new();
        }

        let candidates =
            match tokio::time::timeout(self.timeout, self.oracle.generate_names(n, &self.hint))
                .await
            {
                Ok(Ok(names)) => names,
                Ok(Err(e)) => {
                    warn!("identifier oracle failed, using fallback names: {e}");
                    Vec::new()
                }
                Err(_) => {
                    warn!(
                        "identifier oracle timed out after {} ms, using fallback names",
                        self.timeout.as_millis()
                    );
                    Vec::new()
                }
            };

        let mut names: IndexSet<String> = IndexSet::with_capacity(n);
        for raw in candidates {
            if names.len() == n {
                break;
            }
            if raw.trim().is_empty() {
                continue;
            }
            let name = sanitize(&raw);
            if is_valid_identifier(&name) && !exclude.contains(&name) {
                names.insert(name);
            }
        }

        let usable = names.len();
        let mut counter = 0usize;
        while names.len() < n {
            let candidate = format!("var_{counter}");
            counter += 1;
            if !exclude.contains(&candidate) {
                names.insert(candidate);
            }
        }
        if usable < n {
            debug!("fabricated {} of {} names", n - usable, n);
        }

        names.into_iter().collect()
    }
}
