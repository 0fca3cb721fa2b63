//! Cluster connection.
//!
//! Resolves a kubeconfig (explicit path, else the default lookup), optionally
//! switches context, and builds an authenticated [`kube::Client`].
//!
//! ```rust,ignore
//! use kube_doctor::kubernetes::ClusterClient;
//!
//! let cluster = ClusterClient::connect(Some("staging"), None).await?;
//! println!("connected to {}", cluster.host());
//! ```

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use log::debug;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Failed to create Kubernetes client: {0}")]
    ClientCreation(#[from] kube::Error),

    #[error("Failed to infer Kubernetes config: {0}")]
    Infer(#[from] kube::config::InferConfigError),

    #[error("Failed to read kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("Failed to parse OpenAPI schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Authenticated connection to one cluster.
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
    host: String,
    context: Option<String>,
}

impl ClusterClient {
    pub async fn connect(context: Option<&str>, kubeconfig: Option<&Path>) -> Result<Self, ClusterError> {
        let config = match (context, kubeconfig) {
            (None, None) => Config::infer().await?,
            (context, path) => {
                let kubeconfig = match path {
                    Some(path) => Kubeconfig::read_from(path)?,
                    None => Kubeconfig::read()?,
                };
                let options = KubeConfigOptions {
                    context: context.map(str::to_string),
                    ..Default::default()
                };
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
        };

        let host = config.cluster_url.to_string();
        debug!("Connecting to cluster at {}", host);
        let client = Client::try_from(config)?;
        Ok(Self {
            client,
            host,
            context: context.map(str::to_string),
        })
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Fetch the cluster's OpenAPI v2 document.
    pub async fn openapi_schema(&self) -> Result<serde_json::Value, ClusterError> {
        let request = http::Request::get("/openapi/v2").body(Vec::new())?;
        let text = self.client.request_text(request).await?;
        Ok(serde_json::from_str(&text)?)
    }
}
