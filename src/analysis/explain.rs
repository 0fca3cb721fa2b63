//! Cache-or-compute explanations for analysis results.
//!
//! Results are processed one after another. For each result with failures the
//! failure texts are (optionally) masked, fingerprinted, looked up in the
//! cache and, on a miss, sent to the completion client. The response is
//! cached in its masked form and unmasked before it is attached to the
//! result.

use crate::ai::{CompletionClient, CompletionError, PromptMap};
use crate::analyzer::AnalysisResult;
use crate::anonymize::Redactor;
use crate::cache::{Cache, cache_key};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    #[error("exhausted API quota for AI provider {provider}: {source}")]
    QuotaExhausted {
        provider: String,
        #[source]
        source: CompletionError,
    },

    #[error("failed while calling AI provider {provider}: {source}")]
    ProviderCall {
        provider: String,
        #[source]
        source: CompletionError,
    },
}

impl ExplainError {
    fn classify(provider: &str, source: CompletionError) -> Self {
        let provider = provider.to_string();
        if source.is_quota_exhausted() {
            Self::QuotaExhausted { provider, source }
        } else {
            Self::ProviderCall { provider, source }
        }
    }
}

pub struct ExplanationPipeline {
    client: Arc<dyn CompletionClient>,
    cache: Arc<dyn Cache>,
    prompts: PromptMap,
    language: String,
    anonymize: bool,
    show_progress: bool,
}

impl ExplanationPipeline {
    pub fn new(client: Arc<dyn CompletionClient>, cache: Arc<dyn Cache>) -> Self {
        Self {
            client,
            cache,
            prompts: PromptMap::default(),
            language: "english".to_string(),
            anonymize: false,
            show_progress: false,
        }
    }

    pub fn with_prompts(mut self, prompts: PromptMap) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_anonymize(mut self, anonymize: bool) -> Self {
        self.anonymize = anonymize;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Name of the completion provider behind this pipeline.
    pub fn provider(&self) -> &str {
        self.client.name()
    }

    pub fn close(&self) {
        self.client.close();
    }

    /// Attach an explanation to every result that has failures.
    ///
    /// Stops at the first provider error; results explained before that
    /// point keep their details.
    pub async fn explain(&self, results: &mut [AnalysisResult]) -> Result<(), ExplainError> {
        if results.is_empty() {
            return Ok(());
        }
        debug!("Generating AI analysis for {} results", results.len());

        let bar = self.progress_bar(results.len() as u64);
        for result in results.iter_mut() {
            bar.set_message(format!("Analyzing {}", result.kind));
            if !result.has_failures() {
                bar.inc(1);
                continue;
            }

            let texts: Vec<String> = result
                .failures
                .iter()
                .map(|failure| {
                    if self.anonymize {
                        Redactor::for_failure(failure).mask(&failure.text)
                    } else {
                        failure.text.clone()
                    }
                })
                .collect();
            let input_key = texts.join(" ");

            let response = match self.explain_input(&result.kind, &input_key).await {
                Ok(response) => response,
                Err(err) => {
                    bar.abandon();
                    return Err(err);
                }
            };

            result.details = Some(if self.anonymize {
                Redactor::for_failures(&result.failures).unmask(&response)
            } else {
                response
            });
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(())
    }

    async fn explain_input(&self, kind: &str, input_key: &str) -> Result<String, ExplainError> {
        let provider = self.client.name();
        let key = cache_key(provider, &self.language, input_key);

        if !self.cache.is_disabled() && self.cache.exists(&key) {
            match self.load_cached(&key) {
                Some(cached) => {
                    debug!("Cache hit for {} explanation {}", kind, key);
                    return Ok(cached);
                }
                None => debug!("Cache entry {} unusable, calling {}", key, provider),
            }
        }

        let prompt = self.prompts.render(kind, &self.language, input_key);
        let response = self
            .client
            .get_completion(&prompt)
            .await
            .map_err(|err| ExplainError::classify(provider, err))?;

        if !self.cache.is_disabled() {
            if let Err(err) = self.cache.store(&key, &STANDARD.encode(&response)) {
                warn!("Failed to store explanation in {} cache: {}", self.cache.name(), err);
            }
        }
        Ok(response)
    }

    fn load_cached(&self, key: &str) -> Option<String> {
        let payload = match self.cache.load(key) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Failed to load cached explanation {}: {}", key, err);
                return None;
            }
        };
        match STANDARD.decode(payload.trim()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(err) => {
                    warn!("Cached explanation {} is not UTF-8: {}", key, err);
                    None
                }
            },
            Err(err) => {
                warn!("Failed to decode cached explanation {}: {}", key, err);
                None
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar
    }
}
