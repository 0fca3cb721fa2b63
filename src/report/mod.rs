//! Final report of a run, rendered as JSON or coloured text.

use crate::analysis::store::StoreContents;
use crate::analyzer::{AnalysisResult, AnalysisStats};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    #[serde(rename = "OK")]
    Ok,
    ProblemDetected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub provider: String,
    pub errors: Vec<String>,
    pub status: AnalysisStatus,
    /// Total number of failures across all results
    pub problems: usize,
    pub results: Vec<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<AnalysisStats>,
}

impl Report {
    pub fn new(provider: impl Into<String>, contents: StoreContents) -> Self {
        let problems = contents.results.iter().map(|r| r.failures.len()).sum();
        let status = if problems == 0 {
            AnalysisStatus::Ok
        } else {
            AnalysisStatus::ProblemDetected
        };
        Self {
            provider: provider.into(),
            errors: contents.errors,
            status,
            problems,
            results: contents.results,
            stats: contents.stats,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if !self.provider.is_empty() {
            let _ = writeln!(out, "AI Provider: {}\n", self.provider.bright_cyan());
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "{}", "Warnings:".yellow().bold());
            for error in &self.errors {
                let _ = writeln!(out, "- {}", error.yellow());
            }
            let _ = writeln!(out);
        }

        if self.results.is_empty() {
            let _ = writeln!(out, "{}", "No problems detected".green());
        }

        for (index, result) in self.results.iter().enumerate() {
            let parent = result
                .parent_object
                .as_deref()
                .map(|p| format!("({})", p))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{} {}{}",
                format!("{}: {}", index, result.kind).bold(),
                result.name.bright_blue(),
                parent.cyan()
            );
            for failure in &result.failures {
                let _ = writeln!(out, "- {} {}", "Error:".red(), failure.text.red());
                if let Some(doc) = &failure.kubernetes_doc {
                    let _ = writeln!(out, "  {} {}", "Kubernetes Doc:".red(), doc.red());
                }
            }
            if let Some(details) = &result.details {
                let _ = writeln!(out, "{}", details.green());
            }
            let _ = writeln!(out);
        }

        if !self.stats.is_empty() {
            let _ = writeln!(out, "{}", "Statistics:".bold());
            for stat in &self.stats {
                let _ = writeln!(out, "- Analyzer {} took {:?}", stat.analyzer, stat.duration);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Failure;
    use std::time::Duration;

    fn contents() -> StoreContents {
        StoreContents {
            results: vec![
                AnalysisResult::new("Pod", "shop/web-1")
                    .with_failures(vec![Failure::new("Back-off restarting"), Failure::new("OOMKilled")])
                    .with_parent("Deployment/web"),
            ],
            errors: vec!["[Node] forbidden".to_string()],
            stats: vec![AnalysisStats {
                analyzer: "Pod".to_string(),
                duration: Duration::from_millis(12),
            }],
        }
    }

    #[test]
    fn test_status_and_problem_count() {
        let report = Report::new("openai", contents());
        assert_eq!(report.problems, 2);
        assert_eq!(report.status, AnalysisStatus::ProblemDetected);

        let empty = Report::new("", StoreContents::default());
        assert_eq!(empty.status, AnalysisStatus::Ok);
        assert_eq!(empty.problems, 0);
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&Report::new("openai", contents()).to_json().unwrap()).unwrap();
        assert_eq!(json["provider"], "openai");
        assert_eq!(json["status"], "ProblemDetected");
        assert_eq!(json["problems"], 2);
        assert_eq!(json["errors"][0], "[Node] forbidden");
        assert_eq!(json["results"][0]["kind"], "Pod");
        assert_eq!(json["results"][0]["error"][1]["text"], "OOMKilled");

        let ok: serde_json::Value =
            serde_json::from_str(&Report::new("", StoreContents::default()).to_json().unwrap()).unwrap();
        assert_eq!(ok["status"], "OK");
    }

    #[test]
    fn test_text_rendering() {
        let text = Report::new("openai", contents()).render_text();
        assert!(text.contains("0: Pod"));
        assert!(text.contains("shop/web-1"));
        assert!(text.contains("Back-off restarting"));
        assert!(text.contains("[Node] forbidden"));
        assert!(text.contains("Analyzer Pod took"));

        assert!(Report::new("", StoreContents::default())
            .render_text()
            .contains("No problems detected"));
    }
}
