use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kube-doctor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnose a Kubernetes cluster and explain what is wrong")]
#[command(long_about = "Runs a battery of read-only analyzers against a live cluster, collects the problems they find into one report and, on request, asks an AI provider to explain each problem in plain language.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the cluster and report problems
    Analyze(AnalyzeArgs),

    /// Manage the analyzers run by default
    Filters {
        #[command(subcommand)]
        command: FiltersCommand,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct AnalyzeArgs {
    /// Only run these analyzers (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub filter: Vec<String>,

    /// Namespace to analyze (all namespaces when omitted)
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Label selector applied to every list call
    #[arg(short = 'L', long)]
    pub selector: Option<String>,

    /// Ask the AI provider to explain each problem
    #[arg(short, long)]
    pub explain: bool,

    /// AI provider to use (overrides ai.default_provider)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Language of the explanations
    #[arg(short, long)]
    pub language: Option<String>,

    /// Mask object names before they are sent to the AI provider
    #[arg(short, long)]
    pub anonymize: bool,

    /// Always call the AI provider, ignoring cached explanations
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of analyzers running at once
    #[arg(short, long)]
    pub max_concurrency: Option<i64>,

    /// Attach Kubernetes field documentation to failures
    #[arg(short = 'd', long)]
    pub with_doc: bool,

    /// Report how long each analyzer took
    #[arg(short = 's', long)]
    pub with_stats: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Path to a kubeconfig file
    #[arg(long, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum FiltersCommand {
    /// List available analyzers and which ones are active
    List,

    /// Add analyzers to the active filters
    Add {
        #[arg(required = true, value_delimiter = ',')]
        filters: Vec<String>,
    },

    /// Remove analyzers from the active filters
    Remove {
        #[arg(required = true, value_delimiter = ',')]
        filters: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
