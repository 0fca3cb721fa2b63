//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Used for `openai`, `localai`, `ollama` and any provider that sets a
//! `base_url`.

use super::{CompletionClient, CompletionError};
use crate::config::types::AiProvider;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT: &str = concat!("kube-doctor/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.7;

fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "localai" => Some("http://localhost:8080/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

pub struct OpenAiClient {
    name: String,
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(provider: &AiProvider) -> Result<Self, CompletionError> {
        let base_url = provider
            .base_url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| default_base_url(&provider.name).map(str::to_string))
            .ok_or_else(|| CompletionError::UnsupportedProvider(provider.name.clone()))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            name: provider.name.clone(),
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: provider.api_key.clone().filter(|k| !k.is_empty()),
            model: provider
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: provider.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn get_completion(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!("POST {} (model {})", self.endpoint(), self.model);
        let mut request = self.http_client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
