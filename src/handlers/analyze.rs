use crate::{
    ai::{self, PromptMap},
    analysis::{AnalysisRun, RunOptions, explain::ExplanationPipeline},
    analyzer::AnalyzerConfig,
    anonymize::MaskKey,
    cache,
    cli::{AnalyzeArgs, OutputFormat},
    config::types::Config,
    kubernetes::ClusterClient,
    report::Report,
};
use log::{debug, info};
use std::sync::Arc;

/// Build the explanation pipeline, or fail before any cluster work starts.
pub fn build_explainer(args: &AnalyzeArgs, config: &Config) -> crate::Result<ExplanationPipeline> {
    let provider = ai::select_provider(&config.ai, args.backend.as_deref())?;
    debug!(
        "AI configuration loaded, provider={}, base_url={}, model={}",
        provider.name,
        provider.base_url.as_deref().unwrap_or_default(),
        provider.model.as_deref().unwrap_or_default()
    );
    let client: Arc<dyn ai::CompletionClient> = Arc::from(ai::new_client(&provider)?);
    let cache = cache::from_config(&config.cache, args.no_cache)?;

    Ok(ExplanationPipeline::new(client, cache)
        .with_prompts(PromptMap::with_overrides(&config.ai.prompts))
        .with_language(language(args, config))
        .with_anonymize(args.anonymize)
        .with_progress(args.output == OutputFormat::Text))
}

/// Settings for one run, CLI flags layered over configuration.
pub fn run_options(args: &AnalyzeArgs, config: &Config) -> RunOptions {
    RunOptions {
        filters: args.filter.clone(),
        active_filters: config.analysis.active_filters.clone(),
        max_concurrency: args
            .max_concurrency
            .unwrap_or(config.analysis.max_concurrency),
        plugin_concurrency: config.analysis.plugin_concurrency,
        custom_analyzers: config.analysis.custom_analyzers.clone(),
        with_stats: args.with_stats,
    }
}

/// Per-install mask key when anonymizing, otherwise a throwaway one.
pub fn mask_key(args: &AnalyzeArgs, config: &Config) -> crate::Result<MaskKey> {
    if !args.anonymize {
        return Ok(MaskKey::generate());
    }
    let path = MaskKey::default_path(config.cache.directory.as_deref())?;
    debug!("Using anonymization key {}", path.display());
    Ok(MaskKey::load_or_create(&path)?)
}

fn language(args: &AnalyzeArgs, config: &Config) -> String {
    args.language
        .clone()
        .unwrap_or_else(|| config.analysis.language.clone())
}

pub fn render(report: &Report, format: OutputFormat) -> crate::Result<String> {
    Ok(match format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Text => report.render_text(),
    })
}

pub async fn handle_analyze(args: AnalyzeArgs, config: Config) -> crate::Result<()> {
    let explainer = if args.explain {
        Some(build_explainer(&args, &config)?)
    } else {
        None
    };

    let context = args.context.as_deref().or(config.kubernetes.context.as_deref());
    let kubeconfig = args
        .kubeconfig
        .as_deref()
        .or(config.kubernetes.kubeconfig.as_deref());
    let cluster = ClusterClient::connect(context, kubeconfig).await?;
    info!(
        "Analyzing cluster {} (context {})",
        cluster.host(),
        cluster.context().unwrap_or("current")
    );

    let openapi_schema = if args.with_doc {
        Some(cluster.openapi_schema().await?)
    } else {
        None
    };

    let analyzer_config = AnalyzerConfig {
        client: Some(cluster.client()),
        namespace: args.namespace.clone(),
        label_selector: args.selector.clone(),
        openapi_schema,
        mask_key: mask_key(&args, &config)?,
    };

    let mut run = AnalysisRun::new(analyzer_config, run_options(&args, &config));
    if let Some(pipeline) = explainer {
        run = run.with_explainer(pipeline);
    }

    run.run_analysis().await;
    run.run_custom_analysis().await;
    run.explain().await?;

    let provider = run.provider().to_string();
    let report = Report::new(provider, run.finish());
    println!("{}", render(&report, args.output)?);
    Ok(())
}
