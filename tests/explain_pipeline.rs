use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kube_doctor::ai::{CompletionClient, CompletionError};
use kube_doctor::analysis::explain::{ExplainError, ExplanationPipeline};
use kube_doctor::analyzer::{AnalysisResult, Failure};
use kube_doctor::anonymize::MaskKey;
use kube_doctor::cache::{Cache, CacheError, FileCache, MemoryCache};
use tempfile::TempDir;

/// End-to-end tests for the cache-or-compute explanation pipeline.

struct CountingClient {
    calls: AtomicUsize,
    last_prompt: parking_lot::Mutex<Option<String>>,
}

impl CountingClient {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_prompt: parking_lot::Mutex::new(None),
        }
    }
}

#[async_trait]
impl CompletionClient for CountingClient {
    async fn get_completion(&self, prompt: &str) -> Result<String, CompletionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_prompt.lock() = Some(prompt.to_string());
        Ok(format!("answer #{}", n))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

struct RejectingClient(u16);

#[async_trait]
impl CompletionClient for RejectingClient {
    async fn get_completion(&self, _prompt: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Api {
            status: self.0,
            message: "nope".to_string(),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Cache that must never be consulted.
struct TripwireCache {
    exists_calls: AtomicUsize,
}

impl Cache for TripwireCache {
    fn exists(&self, _key: &str) -> bool {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn load(&self, key: &str) -> Result<String, CacheError> {
        Err(CacheError::NotFound(key.to_string()))
    }

    fn store(&self, _key: &str, _data: &str) -> Result<(), CacheError> {
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "tripwire"
    }
}

fn crashing_pod() -> Vec<AnalysisResult> {
    vec![
        AnalysisResult::new("Pod", "shop/web-1")
            .with_failures(vec![Failure::new("Back-off restarting failed container")]),
    ]
}

#[tokio::test]
async fn test_identical_input_reaches_provider_once() {
    let client = Arc::new(CountingClient::new());
    let pipeline = ExplanationPipeline::new(client.clone(), Arc::new(MemoryCache::new()));

    let mut first = crashing_pod();
    pipeline.explain(&mut first).await.unwrap();
    let mut second = crashing_pod();
    pipeline.explain(&mut second).await.unwrap();

    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first[0].details, second[0].details);
    assert_eq!(first[0].details.as_deref(), Some("answer #1"));
}

#[tokio::test]
async fn test_language_changes_the_cache_key() {
    let client = Arc::new(CountingClient::new());
    let cache = Arc::new(MemoryCache::new());

    let english = ExplanationPipeline::new(client.clone(), cache.clone());
    let german = ExplanationPipeline::new(client.clone(), cache).with_language("german");

    english.explain(&mut crashing_pod()).await.unwrap();
    german.explain(&mut crashing_pod()).await.unwrap();
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    assert!(client.last_prompt.lock().as_deref().unwrap().contains("german"));
}

#[tokio::test]
async fn test_file_cache_survives_a_new_pipeline() {
    let tmp = TempDir::new().unwrap();
    let client = Arc::new(CountingClient::new());

    for _ in 0..2 {
        let pipeline =
            ExplanationPipeline::new(client.clone(), Arc::new(FileCache::new(tmp.path())));
        let mut results = crashing_pod();
        pipeline.explain(&mut results).await.unwrap();
        assert_eq!(results[0].details.as_deref(), Some("answer #1"));
    }
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_cache_is_never_consulted() {
    let client = Arc::new(CountingClient::new());
    let cache = Arc::new(TripwireCache {
        exists_calls: AtomicUsize::new(0),
    });
    let pipeline = ExplanationPipeline::new(client.clone(), cache.clone());

    pipeline.explain(&mut crashing_pod()).await.unwrap();
    pipeline.explain(&mut crashing_pod()).await.unwrap();

    assert_eq!(cache.exists_calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_quota_exhaustion_is_classified() {
    let pipeline = ExplanationPipeline::new(Arc::new(RejectingClient(429)), Arc::new(MemoryCache::new()));
    let err = pipeline.explain(&mut crashing_pod()).await.unwrap_err();

    assert!(matches!(err, ExplainError::QuotaExhausted { .. }));
    assert_eq!(
        err.to_string(),
        "exhausted API quota for AI provider openai: error, status code: 429, message: nope"
    );
}

#[tokio::test]
async fn test_other_provider_errors_are_generic() {
    let pipeline = ExplanationPipeline::new(Arc::new(RejectingClient(503)), Arc::new(MemoryCache::new()));
    let err = pipeline.explain(&mut crashing_pod()).await.unwrap_err();

    assert!(matches!(err, ExplainError::ProviderCall { .. }));
    assert!(err.to_string().starts_with("failed while calling AI provider openai:"));
}

#[tokio::test]
async fn test_anonymized_names_never_reach_provider() {
    let client = Arc::new(CountingClient::new());
    let pipeline = ExplanationPipeline::new(client.clone(), Arc::new(MemoryCache::new()))
        .with_anonymize(true);

    let key = MaskKey::generate();
    let failure = Failure {
        text: "Deployment payments/ledger has 3 replicas but 0 are available".to_string(),
        sensitive: vec![key.sensitive("payments"), key.sensitive("ledger")],
        ..Default::default()
    };
    let mut results = vec![AnalysisResult::new("Deployment", "payments/ledger").with_failures(vec![failure])];
    pipeline.explain(&mut results).await.unwrap();

    let prompt = client.last_prompt.lock().clone().unwrap();
    assert!(!prompt.contains("payments"));
    assert!(!prompt.contains("ledger"));
    assert!(prompt.contains(&key.mask("payments")));
}

#[tokio::test]
async fn test_empty_results_do_nothing() {
    let client = Arc::new(CountingClient::new());
    let pipeline = ExplanationPipeline::new(client.clone(), Arc::new(MemoryCache::new()));
    pipeline.explain(&mut []).await.unwrap();
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}
