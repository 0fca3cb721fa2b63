//! Analyzer capability and the built-in analyzer registry.
//!
//! Every unit of analysis work, whether a built-in cluster inspection or a
//! remote plugin, implements [`Analyzer`]. The engine only ever sees
//! `Arc<dyn Analyzer>` values and never cares which variant it is running.
//!
//! # Registry
//!
//! The registry is split in two:
//!
//! - **core** analyzers run by default when no filter is requested
//! - **additional** analyzers only run when named explicitly or through the
//!   configured active filters
//!
//! ```rust,ignore
//! use kube_doctor::analyzer::AnalyzerRegistry;
//!
//! let registry = AnalyzerRegistry::builtin();
//! assert!(registry.get("Pod").is_some());
//! assert!(registry.core().contains_key("Pod"));
//! ```

pub mod deployment;
pub mod ingress;
pub mod node;
pub mod pod;
pub mod pvc;
pub mod replicaset;
pub mod service;
pub mod types;

use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

pub use types::{AnalysisResult, AnalysisStats, Failure, SensitiveMatch};

/// Error type for a single analyzer invocation.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Kubernetes API error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("No cluster connection available")]
    NoClusterConnection,

    #[error("{0}")]
    Plugin(#[from] crate::analysis::plugin::PluginError),

    #[error("analyzer panicked: {0}")]
    Panicked(String),

    #[error("{message}")]
    Failed { message: String },

    /// The analyzer failed part way but still produced results worth keeping.
    #[error("{source}")]
    Partial {
        results: Vec<AnalysisResult>,
        #[source]
        source: Box<AnalyzerError>,
    },
}

impl AnalyzerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Immutable context handed to every analyzer.
#[derive(Clone, Default)]
pub struct AnalyzerConfig {
    /// Authenticated cluster client; `None` when running without a cluster
    pub client: Option<kube::Client>,
    /// Namespace to inspect (`None` = all namespaces)
    pub namespace: Option<String>,
    /// Label selector applied to list calls
    pub label_selector: Option<String>,
    /// OpenAPI v2 document, fetched only when documentation was requested
    pub openapi_schema: Option<serde_json::Value>,
    /// Key for the masks recorded in each failure's sensitive matches
    pub mask_key: MaskKey,
}

impl Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("connected", &self.client.is_some())
            .field("namespace", &self.namespace)
            .field("label_selector", &self.label_selector)
            .field("openapi_schema", &self.openapi_schema.is_some())
            .field("mask_key", &self.mask_key)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Cluster client, or [`AnalyzerError::NoClusterConnection`].
    pub fn client(&self) -> Result<kube::Client, AnalyzerError> {
        self.client.clone().ok_or(AnalyzerError::NoClusterConnection)
    }

    /// List parameters honouring the configured label selector.
    pub fn list_params(&self) -> ListParams {
        match self.label_selector.as_deref() {
            Some(selector) if !selector.is_empty() => ListParams::default().labels(selector),
            _ => ListParams::default(),
        }
    }

    /// Namespaced API for `K`, scoped to the configured namespace if any.
    pub fn namespaced_api<K>(&self) -> Result<Api<K>, AnalyzerError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let client = self.client()?;
        Ok(match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => Api::namespaced(client, ns),
            _ => Api::all(client),
        })
    }

    /// Description of `field` on an OpenAPI v2 definition, if a schema was
    /// fetched and documents it.
    pub fn field_doc(&self, definition: &str, field: &str) -> Option<String> {
        self.openapi_schema
            .as_ref()?
            .get("definitions")?
            .get(definition)?
            .get("properties")?
            .get(field)?
            .get("description")?
            .as_str()
            .map(str::to_string)
    }

    /// List every `K` visible to this analysis.
    pub async fn list<K>(&self) -> Result<Vec<K>, AnalyzerError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let api = self.namespaced_api::<K>()?;
        Ok(api.list(&self.list_params()).await?.items)
    }
}

/// A named unit of read-only analysis work.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Name used for filters, error tags and statistics.
    fn name(&self) -> &str;

    /// Inspect the cluster and return one result per unhealthy entity.
    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError>;
}

pub type AnalyzerMap = BTreeMap<String, Arc<dyn Analyzer>>;

/// Named analyzers split into the default battery and opt-in extras.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    core: AnalyzerMap,
    additional: AnalyzerMap,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every analyzer shipped with the crate.
    pub fn builtin() -> Self {
        Self::new()
            .with_core(Arc::new(pod::PodAnalyzer))
            .with_core(Arc::new(deployment::DeploymentAnalyzer))
            .with_core(Arc::new(replicaset::ReplicaSetAnalyzer))
            .with_core(Arc::new(service::ServiceAnalyzer))
            .with_core(Arc::new(pvc::PvcAnalyzer))
            .with_core(Arc::new(node::NodeAnalyzer))
            .with_additional(Arc::new(ingress::IngressAnalyzer))
    }

    /// Register an analyzer in the default battery.
    pub fn with_core(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.core.insert(analyzer.name().to_string(), analyzer);
        self
    }

    /// Register an analyzer that only runs when requested by name.
    pub fn with_additional(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.additional
            .insert(analyzer.name().to_string(), analyzer);
        self
    }

    pub fn core(&self) -> &AnalyzerMap {
        &self.core
    }

    pub fn additional(&self) -> &AnalyzerMap {
        &self.additional
    }

    /// Look a name up in the full registry (core and additional).
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Analyzer>> {
        self.core.get(name).or_else(|| self.additional.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every registered name, core first, each group sorted.
    pub fn names(&self) -> Vec<String> {
        self.core
            .keys()
            .chain(self.additional.keys())
            .cloned()
            .collect()
    }
}

/// `namespace/name` for a namespaced object.
pub(crate) fn qualified_name(meta: &kube::api::ObjectMeta) -> String {
    let name = meta.name.as_deref().unwrap_or_default();
    match meta.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

/// Sensitive matches for an object's namespace and name.
pub(crate) fn object_sensitive(meta: &kube::api::ObjectMeta, key: &MaskKey) -> Vec<SensitiveMatch> {
    [meta.namespace.as_deref(), meta.name.as_deref()]
        .into_iter()
        .flatten()
        .filter(|v| !v.is_empty())
        .map(|v| key.sensitive(v))
        .collect()
}
