//! Completion-service clients used to explain analysis failures.

pub mod noop;
pub mod openai;
pub mod prompts;

use crate::config::types::{AiConfig, AiProvider};
use async_trait::async_trait;
use log::debug;

pub use noop::NoOpClient;
pub use openai::OpenAiClient;
pub use prompts::PromptMap;

/// Provider used when neither the CLI nor the configuration names one.
pub const DEFAULT_BACKEND: &str = "openai";

const QUOTA_EXHAUSTED_MARKER: &str = "status code: 429";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("error, status code: {status}, message: {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse completion response: {0}")]
    Parse(String),

    #[error("completion response contained no choices")]
    EmptyResponse,

    #[error("AI provider not specified in configuration")]
    NoProviders,

    #[error("AI provider {0} not specified in configuration")]
    ProviderNotConfigured(String),

    #[error("AI provider {0} is not supported without a base_url")]
    UnsupportedProvider(String),
}

impl CompletionError {
    /// True when the backend rejected the call for rate or quota reasons.
    pub fn is_quota_exhausted(&self) -> bool {
        self.to_string().contains(QUOTA_EXHAUSTED_MARKER)
    }
}

/// A remote service that turns a prompt into text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn get_completion(&self, prompt: &str) -> Result<String, CompletionError>;

    fn name(&self) -> &str;

    /// Release any held connection. Called once at the end of a run.
    fn close(&self) {}
}

/// Resolve which configured provider to use.
///
/// `backend` (from the CLI) wins over `ai.default_provider`, which wins over
/// [`DEFAULT_BACKEND`].
pub fn select_provider(config: &AiConfig, backend: Option<&str>) -> Result<AiProvider, CompletionError> {
    if config.providers.is_empty() {
        return Err(CompletionError::NoProviders);
    }

    let name = backend
        .filter(|b| !b.is_empty())
        .or_else(|| config.default_provider.as_deref().filter(|p| !p.is_empty()))
        .unwrap_or(DEFAULT_BACKEND);
    debug!("Using AI provider {}", name);

    config
        .providers
        .iter()
        .find(|p| p.name == name)
        .cloned()
        .ok_or_else(|| CompletionError::ProviderNotConfigured(name.to_string()))
}

/// Build a client for a configured provider.
pub fn new_client(provider: &AiProvider) -> Result<Box<dyn CompletionClient>, CompletionError> {
    match provider.name.as_str() {
        noop::NOOP_NAME => Ok(Box::new(NoOpClient)),
        _ => Ok(Box::new(OpenAiClient::new(provider)?)),
    }
}
