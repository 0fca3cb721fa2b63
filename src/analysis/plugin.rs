//! Externally hosted analyzer plugins.
//!
//! Plugins are listed in configuration as `{ name, connection = { url, port } }`.
//! Each one is wrapped in a [`PluginAnalyzer`] and run through the same
//! [`BoundedExecutor`] as the built-in analyzers, with its own limit.
//!
//! The default transport is HTTP/JSON: the runner POSTs to
//! `http://<url>:<port>/v1/analyze` and expects `{"result": <AnalysisResult>}`.
//! Other transports plug in through [`PluginConnector`].

use crate::analysis::executor::{BoundedExecutor, NamedTask};
use crate::analysis::store::ResultStore;
use crate::analyzer::{AnalysisResult, Analyzer, AnalyzerConfig, AnalyzerError};
use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const ANALYZE_PATH: &str = "/v1/analyze";
const USER_AGENT: &str = concat!("kube-doctor/", env!("CARGO_PKG_VERSION"));

static RFC1123_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("static RFC 1123 pattern compiles")
});

/// Errors raised while connecting to or running a plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("invalid custom analyzer name {0:?}: must be a lowercase RFC 1123 subdomain")]
    InvalidName(String),

    #[error("invalid connection for custom analyzer {name}: {reason}")]
    InvalidConnection { name: String, reason: String },

    #[error("client creation error for {name} analyzer: {reason}")]
    ClientCreation { name: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("plugin returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to parse plugin response: {0}")]
    Parse(String),
}

/// Where a plugin can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub url: String,
    pub port: u16,
}

/// A plugin entry from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAnalyzer {
    pub name: String,
    pub connection: Connection,
}

impl CustomAnalyzer {
    pub fn new(name: impl Into<String>, url: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            connection: Connection {
                url: url.into(),
                port,
            },
        }
    }

    /// Reject entries that could never be run.
    pub fn validate(&self) -> Result<(), PluginError> {
        if !RFC1123_SUBDOMAIN.is_match(&self.name) {
            return Err(PluginError::InvalidName(self.name.clone()));
        }
        if self.connection.url.trim().is_empty() {
            return Err(PluginError::InvalidConnection {
                name: self.name.clone(),
                reason: "url is empty".to_string(),
            });
        }
        if self.connection.port == 0 {
            return Err(PluginError::InvalidConnection {
                name: self.name.clone(),
                reason: "port must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// A live connection to one plugin.
#[async_trait]
pub trait PluginConnection: Send + Sync {
    async fn run(&self) -> Result<AnalysisResult, PluginError>;
}

/// Builds connections from configuration entries.
pub trait PluginConnector: Send + Sync {
    fn connect(&self, plugin: &CustomAnalyzer) -> Result<Box<dyn PluginConnection>, PluginError>;
}

/// Default HTTP/JSON transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl PluginConnector for HttpConnector {
    fn connect(&self, plugin: &CustomAnalyzer) -> Result<Box<dyn PluginConnection>, PluginError> {
        Ok(Box::new(HttpPluginConnection::new(plugin)?))
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    result: AnalysisResult,
}

/// Plugin reached over HTTP.
pub struct HttpPluginConnection {
    http_client: Client,
    endpoint: reqwest::Url,
}

impl HttpPluginConnection {
    pub fn new(plugin: &CustomAnalyzer) -> Result<Self, PluginError> {
        let client_error = |reason: String| PluginError::ClientCreation {
            name: plugin.name.clone(),
            reason,
        };

        let base = if plugin.connection.url.contains("://") {
            plugin.connection.url.clone()
        } else {
            format!("http://{}", plugin.connection.url)
        };
        let mut endpoint = reqwest::Url::parse(&base).map_err(|e| client_error(e.to_string()))?;
        endpoint
            .set_port(Some(plugin.connection.port))
            .map_err(|_| client_error(format!("cannot set port on {}", base)))?;
        endpoint.set_path(ANALYZE_PATH);

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| client_error(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl PluginConnection for HttpPluginConnection {
    async fn run(&self) -> Result<AnalysisResult, PluginError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PluginError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<AnalyzeResponse>()
            .await
            .map_err(|e| PluginError::Parse(e.to_string()))?;
        Ok(body.result)
    }
}

/// Adapts a configured plugin to the [`Analyzer`] capability.
pub struct PluginAnalyzer {
    plugin: CustomAnalyzer,
    connector: Arc<dyn PluginConnector>,
}

impl PluginAnalyzer {
    pub fn new(plugin: CustomAnalyzer, connector: Arc<dyn PluginConnector>) -> Self {
        Self { plugin, connector }
    }
}

#[async_trait]
impl Analyzer for PluginAnalyzer {
    fn name(&self) -> &str {
        &self.plugin.name
    }

    async fn analyze(&self, _config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let connection = self.connector.connect(&self.plugin)?;
        // an error from the plugin wins over any result it sent along
        let mut result = connection.run().await?;
        if result.kind.is_empty() {
            result.kind = self.plugin.name.clone();
        }
        Ok(vec![result])
    }
}

/// Runs every configured plugin through its own bounded executor.
pub struct CustomPluginRunner {
    executor: BoundedExecutor,
    connector: Arc<dyn PluginConnector>,
}

impl CustomPluginRunner {
    pub fn new(limit: i64) -> Self {
        Self {
            executor: BoundedExecutor::new(limit),
            connector: Arc::new(HttpConnector),
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn PluginConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.executor = self.executor.with_stats(enabled);
        self
    }

    pub fn limit(&self) -> usize {
        self.executor.limit()
    }

    /// Validate, launch and wait for every plugin.
    pub async fn run(
        &self,
        plugins: &[CustomAnalyzer],
        config: Arc<AnalyzerConfig>,
        store: Arc<ResultStore>,
    ) {
        if plugins.is_empty() {
            debug!("No custom analyzers found");
            return;
        }
        debug!(
            "Found custom analyzers {:?}, running up to {} at once",
            plugins.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            self.limit()
        );

        let mut tasks = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            match plugin.validate() {
                Ok(()) => tasks.push(NamedTask::new(
                    plugin.name.clone(),
                    Arc::new(PluginAnalyzer::new(plugin.clone(), Arc::clone(&self.connector))),
                )),
                Err(err) => store.push_error(err.to_string()),
            }
        }

        self.executor.run(tasks, config, store).await;
    }
}
