//! Shared accumulator for results, error strings and timing statistics.
//!
//! All three collections live behind a single [`parking_lot::Mutex`] so that
//! one task's outcome is always written atomically with respect to others.
//! The lock is only held for the append itself, never across an `.await`.

use crate::analyzer::{AnalysisResult, AnalysisStats, AnalyzerError};
use parking_lot::Mutex;
use std::mem;
use std::time::Duration;

#[derive(Debug, Default)]
struct StoreInner {
    results: Vec<AnalysisResult>,
    errors: Vec<String>,
    stats: Vec<AnalysisStats>,
}

/// Snapshot of everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct StoreContents {
    pub results: Vec<AnalysisResult>,
    pub errors: Vec<String>,
    pub stats: Vec<AnalysisStats>,
}

/// Concurrency-safe store shared by every worker of a run.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: Mutex<StoreInner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one task outcome under a single lock acquisition.
    ///
    /// Errors are tagged `[name] <error>`; partial results carried by
    /// [`AnalyzerError::Partial`] are merged before the error is logged.
    pub fn record(
        &self,
        name: &str,
        outcome: Result<Vec<AnalysisResult>, AnalyzerError>,
        elapsed: Option<Duration>,
    ) {
        let mut inner = self.inner.lock();

        if let Some(duration) = elapsed {
            inner.stats.push(AnalysisStats {
                analyzer: name.to_string(),
                duration,
            });
        }

        match outcome {
            Ok(results) => inner.results.extend(results),
            Err(AnalyzerError::Partial { results, source }) => {
                inner.results.extend(results);
                inner.errors.push(format!("[{}] {}", name, source));
            }
            Err(err) => inner.errors.push(format!("[{}] {}", name, err)),
        }
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.inner.lock().errors.push(message.into());
    }

    pub fn push_result(&self, result: AnalysisResult) {
        self.inner.lock().results.push(result);
    }

    pub fn result_count(&self) -> usize {
        self.inner.lock().results.len()
    }

    /// Move the results out, leaving the store's result list empty.
    pub fn take_results(&self) -> Vec<AnalysisResult> {
        mem::take(&mut self.inner.lock().results)
    }

    /// Put results back after an out-of-lock pass over them.
    pub fn restore_results(&self, results: Vec<AnalysisResult>) {
        let mut inner = self.inner.lock();
        let appended = mem::replace(&mut inner.results, results);
        inner.results.extend(appended);
    }

    pub fn snapshot(&self) -> StoreContents {
        let inner = self.inner.lock();
        StoreContents {
            results: inner.results.clone(),
            errors: inner.errors.clone(),
            stats: inner.stats.clone(),
        }
    }

    pub fn into_contents(self) -> StoreContents {
        let inner = self.inner.into_inner();
        StoreContents {
            results: inner.results,
            errors: inner.errors,
            stats: inner.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Failure;

    fn result(kind: &str) -> AnalysisResult {
        AnalysisResult::new(kind, "default/x").with_failures(vec![Failure::new("broken")])
    }

    #[test]
    fn test_record_success_and_failure() {
        let store = ResultStore::new();
        store.record("Pod", Ok(vec![result("Pod")]), Some(Duration::from_millis(5)));
        store.record("Node", Err(AnalyzerError::failed("forbidden")), None);

        let contents = store.snapshot();
        assert_eq!(contents.results.len(), 1);
        assert_eq!(contents.errors, vec!["[Node] forbidden".to_string()]);
        assert_eq!(contents.stats.len(), 1);
        assert_eq!(contents.stats[0].analyzer, "Pod");
    }

    #[test]
    fn test_partial_results_are_merged() {
        let store = ResultStore::new();
        store.record(
            "Service",
            Err(AnalyzerError::Partial {
                results: vec![result("Service")],
                source: Box::new(AnalyzerError::failed("endpoints lookup failed")),
            }),
            None,
        );

        let contents = store.into_contents();
        assert_eq!(contents.results.len(), 1);
        assert_eq!(contents.errors, vec!["[Service] endpoints lookup failed".to_string()]);
    }

    #[test]
    fn test_take_and_restore_keeps_order() {
        let store = ResultStore::new();
        store.push_result(result("Pod"));
        store.push_result(result("Node"));

        let mut taken = store.take_results();
        assert_eq!(store.result_count(), 0);
        taken[0].details = Some("explained".to_string());
        store.restore_results(taken);

        let contents = store.snapshot();
        assert_eq!(contents.results[0].details.as_deref(), Some("explained"));
        assert_eq!(contents.results[1].kind, "Node");
    }
}
