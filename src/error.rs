use crate::ai::CompletionError;
use crate::analysis::explain::ExplainError;
use crate::anonymize::MaskKeyError;
use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::kubernetes::ClusterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeDoctorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Anonymization error: {0}")]
    Anonymize(#[from] MaskKeyError),

    #[error("{0}")]
    Completion(#[from] CompletionError),

    #[error("{0}")]
    Explain(#[from] ExplainError),

    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("Filter {0} does not exist. Please run kube-doctor filters list.")]
    UnknownFilter(String),

    #[error("Filter {0} is not active")]
    InactiveFilter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KubeDoctorError>;
