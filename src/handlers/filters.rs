use crate::{
    analyzer::AnalyzerRegistry,
    cli::FiltersCommand,
    config::{self, types::Config},
    error::KubeDoctorError,
};
use colored::Colorize;
use std::fmt::Write;
use std::path::Path;

/// Filters currently in effect: the configured list, else the core battery.
fn effective_filters(config: &Config, registry: &AnalyzerRegistry) -> Vec<String> {
    if config.analysis.active_filters.is_empty() {
        registry.core().keys().cloned().collect()
    } else {
        config.analysis.active_filters.clone()
    }
}

pub fn list_filters(config: &Config, registry: &AnalyzerRegistry) -> String {
    let active = effective_filters(config, registry);
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Active:".bold());
    for name in &active {
        let _ = writeln!(out, "> {}", name.green());
    }

    let unused: Vec<String> = registry
        .names()
        .into_iter()
        .filter(|name| !active.contains(name))
        .collect();
    if !unused.is_empty() {
        let _ = writeln!(out, "{}", "Unused:".bold());
        for name in &unused {
            let _ = writeln!(out, "> {}", name.red());
        }
    }

    if !config.analysis.custom_analyzers.is_empty() {
        let _ = writeln!(out, "{}", "Custom analyzers:".bold());
        for plugin in &config.analysis.custom_analyzers {
            let _ = writeln!(
                out,
                "> {} ({}:{})",
                plugin.name.cyan(),
                plugin.connection.url,
                plugin.connection.port
            );
        }
    }
    out
}

/// Add `names` to the active filters; returns the names actually added.
pub fn add_filters(
    config: &mut Config,
    names: &[String],
    registry: &AnalyzerRegistry,
) -> crate::Result<Vec<String>> {
    if let Some(unknown) = names.iter().find(|name| !registry.contains(name)) {
        return Err(KubeDoctorError::UnknownFilter(unknown.clone()));
    }

    let mut active = effective_filters(config, registry);
    let mut added = Vec::new();
    for name in names {
        if !active.contains(name) {
            active.push(name.clone());
            added.push(name.clone());
        }
    }
    config.analysis.active_filters = active;
    Ok(added)
}

/// Remove `names` from the active filters.
pub fn remove_filters(
    config: &mut Config,
    names: &[String],
    registry: &AnalyzerRegistry,
) -> crate::Result<()> {
    let mut active = effective_filters(config, registry);
    if let Some(inactive) = names.iter().find(|name| !active.contains(name)) {
        return Err(KubeDoctorError::InactiveFilter(inactive.clone()));
    }
    active.retain(|name| !names.contains(name));
    config.analysis.active_filters = active;
    Ok(())
}

/// Write back to the file the configuration came from, or to the global
/// file when none was loaded.
fn persist(config: &Config, path: Option<&Path>) -> crate::Result<()> {
    match path {
        Some(path) => config::save_config(config, path)?,
        None => config::save_global_config(config)?,
    }
    Ok(())
}

pub fn handle_filters(
    command: FiltersCommand,
    mut config: Config,
    config_path: Option<&Path>,
) -> crate::Result<()> {
    let registry = AnalyzerRegistry::builtin();
    match command {
        FiltersCommand::List => print!("{}", list_filters(&config, &registry)),
        FiltersCommand::Add { filters } => {
            let added = add_filters(&mut config, &filters, &registry)?;
            persist(&config, config_path)?;
            if added.is_empty() {
                println!("Filters already active: {}", filters.join(", "));
            } else {
                println!("{} {}", "Filters added:".green(), added.join(", "));
            }
        }
        FiltersCommand::Remove { filters } => {
            remove_filters(&mut config, &filters, &registry)?;
            persist(&config, config_path)?;
            println!("{} {}", "Filters removed:".green(), filters.join(", "));
        }
    }
    Ok(())
}
