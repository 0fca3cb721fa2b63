//! Core types shared by analyzers, the execution engine and the report.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A literal substring that must not leave the process unredacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveMatch {
    /// Original value as it appears in the failure text
    pub unmasked: String,
    /// Replacement sent to the completion service
    pub masked: String,
}

impl SensitiveMatch {
    pub fn new(unmasked: impl Into<String>, masked: impl Into<String>) -> Self {
        Self {
            unmasked: unmasked.into(),
            masked: masked.into(),
        }
    }
}

/// One problem found on an inspected entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    /// Human-readable description of the problem
    pub text: String,
    /// Substrings of `text` that are redacted when anonymizing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitive: Vec<SensitiveMatch>,
    /// Field documentation from the cluster's OpenAPI schema (`--with-doc`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_doc: Option<String>,
}

impl Failure {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sensitive: Vec::new(),
            kubernetes_doc: None,
        }
    }

    /// Register a sensitive substring of this failure's text.
    pub fn with_sensitive(mut self, unmasked: impl Into<String>, masked: impl Into<String>) -> Self {
        self.sensitive.push(SensitiveMatch::new(unmasked, masked));
        self
    }
}

/// Findings for a single inspected entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Resource or category name, e.g. `Pod`
    #[serde(default)]
    pub kind: String,
    /// Entity name (`namespace/name` for namespaced objects)
    #[serde(default)]
    pub name: String,
    /// Problems found on the entity
    #[serde(rename = "error", default)]
    pub failures: Vec<Failure>,
    /// Explanation written by the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Owning workload, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_object: Option<String>,
}

impl AnalysisResult {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_failures(mut self, failures: Vec<Failure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_object = Some(parent.into());
        self
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Wall-clock time spent by one analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub analyzer: String,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
