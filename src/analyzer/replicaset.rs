//! ReplicaSet analyzer: replica failure conditions (quota, admission, ...).

use super::{Analyzer, AnalyzerConfig, AnalyzerError, object_sensitive, qualified_name};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;

pub struct ReplicaSetAnalyzer;

#[async_trait]
impl Analyzer for ReplicaSetAnalyzer {
    fn name(&self) -> &str {
        "ReplicaSet"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let replicasets = config.list::<ReplicaSet>().await?;
        Ok(replicasets
            .iter()
            .filter_map(|rs| inspect_replicaset(rs, &config.mask_key))
            .collect())
    }
}

fn inspect_replicaset(rs: &ReplicaSet, key: &MaskKey) -> Option<AnalysisResult> {
    let status = rs.status.as_ref()?;
    let sensitive = object_sensitive(&rs.metadata, key);

    let failures: Vec<Failure> = status
        .conditions
        .iter()
        .flatten()
        .filter(|c| c.type_ == "ReplicaFailure" && c.status == "True")
        .map(|c| Failure {
            text: format!(
                "{} {}",
                c.reason.as_deref().unwrap_or("ReplicaFailure"),
                c.message.as_deref().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
            sensitive: sensitive.clone(),
            ..Default::default()
        })
        .collect();

    if failures.is_empty() {
        return None;
    }

    let mut result = AnalysisResult::new("ReplicaSet", qualified_name(&rs.metadata))
        .with_failures(failures);
    result.parent_object = rs
        .metadata
        .owner_references
        .as_ref()
        .and_then(|refs| refs.first())
        .map(|owner| format!("{}/{}", owner.kind, owner.name));
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{ReplicaSetCondition, ReplicaSetStatus};
    use kube::api::ObjectMeta;

    #[test]
    fn test_replica_failure_condition() {
        let rs = ReplicaSet {
            metadata: ObjectMeta {
                name: Some("api-5f7".to_string()),
                namespace: Some("payments".to_string()),
                ..Default::default()
            },
            status: Some(ReplicaSetStatus {
                conditions: Some(vec![ReplicaSetCondition {
                    type_: "ReplicaFailure".to_string(),
                    status: "True".to_string(),
                    reason: Some("FailedCreate".to_string()),
                    message: Some("exceeded quota: compute-resources".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let result = inspect_replicaset(&rs, &MaskKey::default()).unwrap();
        assert_eq!(
            result.failures[0].text,
            "FailedCreate exceeded quota: compute-resources"
        );
    }
}
