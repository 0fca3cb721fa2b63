//! The analysis engine.
//!
//! An [`AnalysisRun`] ties the pieces together for one invocation:
//!
//! 1. [`selector`] resolves filters into named analyzer tasks
//! 2. [`executor`] runs them under a concurrency limit into a [`store::ResultStore`]
//! 3. [`plugin`] runs configured custom analyzers into the same store
//! 4. [`explain`] optionally attaches generated explanations
//!
//! The run owns its store; the cluster client, cache and completion client
//! are shared handles that outlive it.

pub mod executor;
pub mod explain;
pub mod plugin;
pub mod selector;
pub mod store;

use crate::analyzer::{AnalyzerConfig, AnalyzerRegistry};
use executor::BoundedExecutor;
use explain::{ExplainError, ExplanationPipeline};
use log::debug;
use plugin::{CustomAnalyzer, CustomPluginRunner, HttpConnector, PluginConnector};
use std::mem;
use std::sync::Arc;
use store::{ResultStore, StoreContents};

/// Per-invocation settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Filters given on the command line
    pub filters: Vec<String>,
    /// Filters persisted in configuration
    pub active_filters: Vec<String>,
    pub max_concurrency: i64,
    pub plugin_concurrency: i64,
    pub custom_analyzers: Vec<CustomAnalyzer>,
    pub with_stats: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            active_filters: Vec::new(),
            max_concurrency: executor::DEFAULT_CONCURRENCY as i64,
            plugin_concurrency: executor::DEFAULT_CONCURRENCY as i64,
            custom_analyzers: Vec::new(),
            with_stats: false,
        }
    }
}

pub struct AnalysisRun {
    config: Arc<AnalyzerConfig>,
    registry: AnalyzerRegistry,
    options: RunOptions,
    store: Arc<ResultStore>,
    explainer: Option<ExplanationPipeline>,
    plugin_connector: Arc<dyn PluginConnector>,
}

impl AnalysisRun {
    pub fn new(config: AnalyzerConfig, options: RunOptions) -> Self {
        Self {
            config: Arc::new(config),
            registry: AnalyzerRegistry::builtin(),
            options,
            store: Arc::new(ResultStore::new()),
            explainer: None,
            plugin_connector: Arc::new(HttpConnector),
        }
    }

    pub fn with_registry(mut self, registry: AnalyzerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Enable explanations through `pipeline`.
    pub fn with_explainer(mut self, pipeline: ExplanationPipeline) -> Self {
        self.explainer = Some(pipeline);
        self
    }

    pub fn with_plugin_connector(mut self, connector: Arc<dyn PluginConnector>) -> Self {
        self.plugin_connector = connector;
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Name of the completion provider, empty when explanations are off.
    pub fn provider(&self) -> &str {
        self.explainer
            .as_ref()
            .map(ExplanationPipeline::provider)
            .unwrap_or_default()
    }

    /// Run the selected built-in analyzers.
    pub async fn run_analysis(&self) {
        let mut selection = selector::select_analyzers(
            &self.options.filters,
            &self.options.active_filters,
            &self.registry,
        );
        for error in std::mem::take(&mut selection.errors) {
            self.store.push_error(error);
        }
        debug!("Running analyzers {:?}", selection.task_names());

        BoundedExecutor::new(self.options.max_concurrency)
            .with_stats(self.options.with_stats)
            .run(selection.tasks, Arc::clone(&self.config), Arc::clone(&self.store))
            .await;
    }

    /// Run every configured custom analyzer.
    pub async fn run_custom_analysis(&self) {
        CustomPluginRunner::new(self.options.plugin_concurrency)
            .with_connector(Arc::clone(&self.plugin_connector))
            .with_stats(self.options.with_stats)
            .run(
                &self.options.custom_analyzers,
                Arc::clone(&self.config),
                Arc::clone(&self.store),
            )
            .await;
    }

    /// Attach explanations to the collected results.
    ///
    /// A no-op when no explainer was configured. Results explained before an
    /// error stay explained.
    pub async fn explain(&self) -> Result<(), ExplainError> {
        let Some(pipeline) = &self.explainer else {
            return Ok(());
        };
        let mut results = self.store.take_results();
        let outcome = pipeline.explain(&mut results).await;
        self.store.restore_results(results);
        outcome
    }

    /// Release the completion client and hand back everything collected.
    pub fn finish(mut self) -> StoreContents {
        self.close_explainer();
        match Arc::try_unwrap(mem::take(&mut self.store)) {
            Ok(store) => store.into_contents(),
            Err(shared) => shared.snapshot(),
        }
    }

    fn close_explainer(&mut self) {
        if let Some(pipeline) = self.explainer.take() {
            debug!("Closing {} completion client", pipeline.provider());
            pipeline.close();
        }
    }
}

/// The completion client is closed however the run ends, including when
/// explaining fails and the run is dropped without [`AnalysisRun::finish`].
impl Drop for AnalysisRun {
    fn drop(&mut self) {
        self.close_explainer();
    }
}
