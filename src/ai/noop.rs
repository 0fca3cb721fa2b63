use super::{CompletionClient, CompletionError};
use async_trait::async_trait;

pub const NOOP_NAME: &str = "noop";

/// Offline client that echoes the prompt back. Handy for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpClient;

#[async_trait]
impl CompletionClient for NoOpClient {
    async fn get_completion(&self, prompt: &str) -> Result<String, CompletionError> {
        Ok(format!("I am a noop response to the prompt {}", prompt))
    }

    fn name(&self) -> &str {
        NOOP_NAME
    }
}
