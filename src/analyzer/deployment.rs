//! Deployment analyzer: fewer ready replicas than desired.

use super::{Analyzer, AnalyzerConfig, AnalyzerError, object_sensitive, qualified_name};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;

const REPLICAS_DOC_DEFINITION: &str = "io.k8s.api.apps.v1.DeploymentSpec";

pub struct DeploymentAnalyzer;

#[async_trait]
impl Analyzer for DeploymentAnalyzer {
    fn name(&self) -> &str {
        "Deployment"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let deployments = config.list::<Deployment>().await?;
        let doc = config.field_doc(REPLICAS_DOC_DEFINITION, "replicas");
        Ok(deployments
            .iter()
            .filter_map(|d| inspect_deployment(d, doc.as_deref(), &config.mask_key))
            .collect())
    }
}

fn inspect_deployment(
    deployment: &Deployment,
    doc: Option<&str>,
    key: &MaskKey,
) -> Option<AnalysisResult> {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let ready = deployment
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0);

    if ready >= desired {
        return None;
    }

    let name = qualified_name(&deployment.metadata);
    let failure = Failure {
        text: format!(
            "Deployment {} has {} replicas but {} are available",
            name, desired, ready
        ),
        sensitive: object_sensitive(&deployment.metadata, key),
        kubernetes_doc: doc.map(str::to_string),
    };
    Some(AnalysisResult::new("Deployment", name).with_failures(vec![failure]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    use kube::api::ObjectMeta;

    fn deployment(desired: i32, ready: Option<i32>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                namespace: Some("payments".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(desired),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                ready_replicas: ready,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_degraded_deployment() {
        let result = inspect_deployment(&deployment(3, Some(1)), None, &MaskKey::default()).unwrap();
        assert_eq!(
            result.failures[0].text,
            "Deployment payments/api has 3 replicas but 1 are available"
        );
    }

    #[test]
    fn test_healthy_deployment() {
        assert!(inspect_deployment(&deployment(2, Some(2)), None, &MaskKey::default()).is_none());
        assert!(inspect_deployment(&deployment(0, None), None, &MaskKey::default()).is_none());
    }

    #[test]
    fn test_replicas_doc_is_attached() {
        let result = inspect_deployment(
            &deployment(2, Some(0)),
            Some("Number of desired pods."),
            &MaskKey::default(),
        )
        .unwrap();
        assert_eq!(
            result.failures[0].kubernetes_doc.as_deref(),
            Some("Number of desired pods.")
        );
    }
}
