//! PersistentVolumeClaim analyzer: claims stuck in `Pending`.

use super::{Analyzer, AnalyzerConfig, AnalyzerError, object_sensitive, qualified_name};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;

pub struct PvcAnalyzer;

#[async_trait]
impl Analyzer for PvcAnalyzer {
    fn name(&self) -> &str {
        "PersistentVolumeClaim"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let claims = config.list::<PersistentVolumeClaim>().await?;
        Ok(claims
            .iter()
            .filter_map(|claim| inspect_claim(claim, &config.mask_key))
            .collect())
    }
}

fn inspect_claim(claim: &PersistentVolumeClaim, key: &MaskKey) -> Option<AnalysisResult> {
    let phase = claim.status.as_ref()?.phase.as_deref()?;
    if phase != "Pending" {
        return None;
    }

    let name = qualified_name(&claim.metadata);
    let storage_class = claim
        .spec
        .as_ref()
        .and_then(|spec| spec.storage_class_name.as_deref())
        .unwrap_or("<default>");
    let failure = Failure {
        text: format!(
            "PersistentVolumeClaim {} is Pending (storage class {})",
            name, storage_class
        ),
        sensitive: object_sensitive(&claim.metadata, key),
        ..Default::default()
    };
    Some(AnalysisResult::new("PersistentVolumeClaim", name).with_failures(vec![failure]))
}
