//! Resolve requested filters into the analyzer tasks to run.
//!
//! Precedence is strict:
//!
//! 1. explicit filters (CLI), if any were given at all
//! 2. configured active filters
//! 3. the full core battery

use crate::analysis::executor::NamedTask;
use crate::analyzer::AnalyzerRegistry;
use log::debug;
use std::sync::Arc;

/// Where the selected task list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Explicit,
    ActiveFilters,
    CoreDefaults,
}

/// Tasks to submit plus configuration errors found while resolving them.
#[derive(Debug)]
pub struct Selection {
    pub source: SelectionSource,
    pub tasks: Vec<NamedTask>,
    pub errors: Vec<String>,
}

impl Selection {
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Error message for a filter name missing from the registry.
pub fn unknown_filter_message(name: &str) -> String {
    format!(
        "\"{}\" filter does not exist. Please run kube-doctor filters list.",
        name
    )
}

/// Pick the analyzers to run.
///
/// Unknown explicit filters produce one error each and are skipped; unknown
/// active filters are skipped silently since they come from configuration.
pub fn select_analyzers(
    explicit: &[String],
    active: &[String],
    registry: &AnalyzerRegistry,
) -> Selection {
    if explicit.is_empty() && active.is_empty() {
        debug!("No filters selected and no active filters found, run all core analyzers");
        let tasks = registry
            .core()
            .iter()
            .map(|(name, analyzer)| NamedTask::new(name.clone(), Arc::clone(analyzer)))
            .collect();
        return Selection {
            source: SelectionSource::CoreDefaults,
            tasks,
            errors: Vec::new(),
        };
    }

    if !explicit.is_empty() {
        debug!("Filter flags {:?} specified, run selected analyzers", explicit);
        let mut tasks = Vec::new();
        let mut errors = Vec::new();
        for name in explicit {
            match registry.get(name) {
                Some(analyzer) => tasks.push(NamedTask::new(name.clone(), Arc::clone(analyzer))),
                None => errors.push(unknown_filter_message(name)),
            }
        }
        return Selection {
            source: SelectionSource::Explicit,
            tasks,
            errors,
        };
    }

    debug!("Found active filters {:?}, run selected analyzers", active);
    let tasks = active
        .iter()
        .filter_map(|name| {
            registry
                .get(name)
                .map(|analyzer| NamedTask::new(name.clone(), Arc::clone(analyzer)))
        })
        .collect();
    Selection {
        source: SelectionSource::ActiveFilters,
        tasks,
        errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_to_core_battery() {
        let registry = AnalyzerRegistry::builtin();
        let selection = select_analyzers(&[], &[], &registry);

        assert_eq!(selection.source, SelectionSource::CoreDefaults);
        assert_eq!(selection.tasks.len(), registry.core().len());
        assert!(!selection.task_names().contains(&"Ingress"));
    }

    #[test]
    fn test_explicit_filters_override_active_filters() {
        let registry = AnalyzerRegistry::builtin();
        let selection = select_analyzers(&names(&["Ingress"]), &names(&["Pod", "Node"]), &registry);

        assert_eq!(selection.source, SelectionSource::Explicit);
        assert_eq!(selection.task_names(), vec!["Ingress"]);
    }

    #[test]
    fn test_unknown_explicit_filter_is_reported_once() {
        let registry = AnalyzerRegistry::builtin();
        let selection = select_analyzers(&names(&["Pod", "bogus", "Node"]), &[], &registry);

        assert_eq!(selection.task_names(), vec!["Pod", "Node"]);
        assert_eq!(selection.errors.len(), 1);
        assert!(selection.errors[0].contains("bogus"));
    }

    #[test]
    fn test_unknown_active_filter_is_skipped_silently() {
        let registry = AnalyzerRegistry::builtin();
        let selection = select_analyzers(&[], &names(&["Service", "bogus"]), &registry);

        assert_eq!(selection.source, SelectionSource::ActiveFilters);
        assert_eq!(selection.task_names(), vec!["Service"]);
        assert!(selection.errors.is_empty());
    }
}
