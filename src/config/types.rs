use crate::analysis::executor::DEFAULT_CONCURRENCY;
use crate::analysis::plugin::CustomAnalyzer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Cluster connection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KubernetesConfig {
    /// Kubeconfig context (current context when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Explicit kubeconfig path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Filters run when none are given on the command line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_filters: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub max_concurrency: i64,
    #[serde(default = "default_concurrency")]
    pub plugin_concurrency: i64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_analyzers: Vec<CustomAnalyzer>,
}

/// AI provider configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<AiProvider>,
    /// Prompt templates keyed by result kind (`default` replaces the built-in)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompts: BTreeMap<String, String>,
}

/// One configured completion backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiProvider {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Explanation cache settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub kind: CacheKind,
    /// Directory for the file cache (user cache dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    #[default]
    File,
    Memory,
}

fn default_concurrency() -> i64 {
    DEFAULT_CONCURRENCY as i64
}

fn default_language() -> String {
    "english".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            active_filters: Vec::new(),
            max_concurrency: default_concurrency(),
            plugin_concurrency: default_concurrency(),
            language: default_language(),
            custom_analyzers: Vec::new(),
        }
    }
}
