//! Bounded-concurrency execution of named analyzer tasks.
//!
//! The executor is a counting semaphore in front of a [`JoinSet`]:
//!
//! 1. for each task, a permit is acquired (submission waits while the gate
//!    is saturated)
//! 2. the task is spawned on the runtime together with its permit
//! 3. the task runs, is timed, and its outcome is written to the
//!    [`ResultStore`]; only then is the permit released
//! 4. `run` returns once every spawned task has been joined
//!
//! A failing or panicking task never affects its siblings. There is no
//! per-task timeout: a task that never finishes keeps its permit.

use crate::analysis::store::ResultStore;
use crate::analyzer::{Analyzer, AnalyzerConfig, AnalyzerError};
use futures_util::FutureExt;
use log::{debug, error};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Limit used when the configured value is zero or negative.
pub const DEFAULT_CONCURRENCY: usize = 10;
/// Upper bound on simultaneously running tasks.
pub const MAX_CONCURRENCY: usize = 100;

/// Clamp a configured concurrency value into `1..=MAX_CONCURRENCY`.
pub fn clamp_concurrency(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_CONCURRENCY
    } else {
        (limit as u64).min(MAX_CONCURRENCY as u64) as usize
    }
}

/// An analyzer scheduled under a specific name.
#[derive(Clone)]
pub struct NamedTask {
    pub name: String,
    pub analyzer: Arc<dyn Analyzer>,
}

impl NamedTask {
    pub fn new(name: impl Into<String>, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            name: name.into(),
            analyzer,
        }
    }
}

impl std::fmt::Debug for NamedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedTask").field("name", &self.name).finish()
    }
}

/// Runs tasks with at most `limit` of them in flight.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    limit: usize,
    collect_stats: bool,
}

impl BoundedExecutor {
    /// Create an executor; `limit` is clamped with [`clamp_concurrency`].
    pub fn new(limit: i64) -> Self {
        Self {
            limit: clamp_concurrency(limit),
            collect_stats: false,
        }
    }

    /// Record per-task wall-clock durations.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.collect_stats = enabled;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every task and wait until all outcomes are recorded in `store`.
    pub async fn run(
        &self,
        tasks: Vec<NamedTask>,
        config: Arc<AnalyzerConfig>,
        store: Arc<ResultStore>,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut workers = JoinSet::new();

        for task in tasks {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    store.push_error(format!("[{}] concurrency gate closed before launch", task.name));
                    continue;
                }
            };

            let config = Arc::clone(&config);
            let store = Arc::clone(&store);
            let collect_stats = self.collect_stats;

            workers.spawn(async move {
                debug!("{} launched", task.name);
                let started = Instant::now();

                let outcome = AssertUnwindSafe(task.analyzer.analyze(&config))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(AnalyzerError::Panicked(panic_message(&*panic))));

                let elapsed = collect_stats.then(|| started.elapsed());
                if outcome.is_err() {
                    debug!("{} completed with errors", task.name);
                } else {
                    debug!("{} completed without errors", task.name);
                }

                store.record(&task.name, outcome, elapsed);
                drop(permit);
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!("analysis worker could not be joined: {}", err);
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_concurrency() {
        assert_eq!(clamp_concurrency(0), DEFAULT_CONCURRENCY);
        assert_eq!(clamp_concurrency(-5), DEFAULT_CONCURRENCY);
        assert_eq!(clamp_concurrency(1), 1);
        assert_eq!(clamp_concurrency(100), 100);
        assert_eq!(clamp_concurrency(101), MAX_CONCURRENCY);
        assert_eq!(clamp_concurrency(i64::MAX), MAX_CONCURRENCY);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(&*boxed), "kaboom");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*boxed), "unknown panic payload");
    }

    #[tokio::test]
    async fn test_empty_task_list_returns_immediately() {
        let store = Arc::new(ResultStore::new());
        BoundedExecutor::new(3)
            .run(Vec::new(), Arc::new(AnalyzerConfig::default()), Arc::clone(&store))
            .await;
        assert!(store.snapshot().results.is_empty());
    }
}
