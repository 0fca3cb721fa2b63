//! Prompt templates keyed by result kind.
//!
//! Templates use two placeholders: `{language}` and `{failures}`.

use std::collections::BTreeMap;

pub const DEFAULT_PROMPT_KEY: &str = "default";

pub const DEFAULT_PROMPT: &str = "Simplify the following Kubernetes error message delimited by triple dashes written in --- {language} --- language; --- {failures} ---.
Provide the most possible solution in a step by step style in no more than 280 characters. Write the output in the following format:
Error: <explain the error here>
Solution: <step by step solution here>";

const PLACEHOLDER_LANGUAGE: &str = "{language}";
const PLACEHOLDER_FAILURES: &str = "{failures}";

#[derive(Debug, Clone)]
pub struct PromptMap {
    templates: BTreeMap<String, String>,
}

impl Default for PromptMap {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(DEFAULT_PROMPT_KEY.to_string(), DEFAULT_PROMPT.to_string());
        Self { templates }
    }
}

impl PromptMap {
    /// Defaults overlaid with configured templates.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (kind, template) in overrides {
            map.templates.insert(kind.clone(), template.clone());
        }
        map
    }

    pub fn insert(&mut self, kind: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(kind.into(), template.into());
    }

    /// Template registered for `kind`, else the default.
    pub fn template_for(&self, kind: &str) -> &str {
        self.templates
            .get(kind)
            .or_else(|| self.templates.get(DEFAULT_PROMPT_KEY))
            .map(String::as_str)
            .unwrap_or(DEFAULT_PROMPT)
    }

    pub fn render(&self, kind: &str, language: &str, failures: &str) -> String {
        self.template_for(kind)
            .replace(PLACEHOLDER_LANGUAGE, language)
            .replace(PLACEHOLDER_FAILURES, failures)
    }
}
