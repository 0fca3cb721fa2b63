//! # kube-doctor
//!
//! Diagnoses a live Kubernetes cluster by running many independent, read-only
//! analyzers concurrently, collecting what they find into one report, and
//! optionally asking an AI provider to explain each problem.
//!
//! ## Features
//!
//! - **Bounded concurrency**: analyzers and custom plugins run under a
//!   semaphore-gated worker pool; one failing analyzer never stops the rest
//! - **Custom analyzers**: remote plugins reachable over HTTP/JSON share the
//!   same execution path as the built-ins
//! - **Cached explanations**: responses are cached by content fingerprint
//! - **Anonymization**: object names are masked before leaving the process
//!   and restored in the explanation
//!
//! ## Example
//!
//! ```rust,no_run
//! use kube_doctor::analysis::{AnalysisRun, RunOptions};
//! use kube_doctor::analyzer::AnalyzerConfig;
//! use kube_doctor::kubernetes::ClusterClient;
//! use kube_doctor::report::Report;
//!
//! # async fn demo() -> kube_doctor::Result<()> {
//! let cluster = ClusterClient::connect(None, None).await?;
//! let config = AnalyzerConfig {
//!     client: Some(cluster.client()),
//!     ..Default::default()
//! };
//! let run = AnalysisRun::new(config, RunOptions::default());
//! run.run_analysis().await;
//! let report = Report::new("", run.finish());
//! println!("{}", report.render_text());
//! # Ok(())
//! # }
//! ```

pub mod ai;
pub mod analysis;
pub mod analyzer;
pub mod anonymize;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod kubernetes;
pub mod report;

pub use error::{KubeDoctorError, Result};
use cli::Commands;
use std::path::Path;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_command(
    command: Commands,
    config: config::types::Config,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Commands::Analyze(args) => handlers::handle_analyze(args, config).await,
        Commands::Filters { command } => handlers::handle_filters(command, config, config_path),
    }
}
