use clap::Parser;
use kube_doctor::{cli::Cli, config, run_command};
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> kube_doctor::Result<()> {
    // kube and reqwest both pull in rustls; pick the provider once up front
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let cwd = std::env::current_dir().ok();
    let config_path = config::find_config_path(cli.config.as_deref(), cwd.as_deref());
    let config = config::load_config(config_path.as_deref(), None)?;

    run_command(cli.command, config, config_path.as_deref()).await
}
