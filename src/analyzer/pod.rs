//! Pod analyzer: unschedulable pods and containers stuck in error states.

use super::{Analyzer, AnalyzerConfig, AnalyzerError, object_sensitive, qualified_name};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ContainerStatus, Pod};

/// Waiting reasons that indicate a broken container rather than a slow start.
const ERROR_REASONS: &[&str] = &[
    "CrashLoopBackOff",
    "ImagePullBackOff",
    "ErrImagePull",
    "InvalidImageName",
    "CreateContainerConfigError",
    "CreateContainerError",
    "RunContainerError",
];

pub struct PodAnalyzer;

#[async_trait]
impl Analyzer for PodAnalyzer {
    fn name(&self) -> &str {
        "Pod"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let pods = config.list::<Pod>().await?;
        Ok(pods
            .iter()
            .filter_map(|pod| inspect_pod(pod, &config.mask_key))
            .collect())
    }
}

fn inspect_pod(pod: &Pod, key: &MaskKey) -> Option<AnalysisResult> {
    let sensitive = object_sensitive(&pod.metadata, key);
    let mut failures = Vec::new();

    if let Some(status) = &pod.status {
        if status.phase.as_deref() == Some("Pending") {
            for condition in status.conditions.iter().flatten() {
                if condition.type_ == "PodScheduled"
                    && condition.reason.as_deref() == Some("Unschedulable")
                {
                    let message = condition.message.clone().unwrap_or_default();
                    failures.push(Failure {
                        text: format!("Pod {} is unschedulable: {}", qualified_name(&pod.metadata), message),
                        sensitive: sensitive.clone(),
                        ..Default::default()
                    });
                }
            }
        }

        let statuses = status
            .init_container_statuses
            .iter()
            .flatten()
            .chain(status.container_statuses.iter().flatten());
        for container in statuses {
            if let Some(text) = container_failure(container) {
                failures.push(Failure {
                    text,
                    sensitive: sensitive.clone(),
                    ..Default::default()
                });
            }
        }
    }

    if failures.is_empty() {
        return None;
    }

    let parent = pod
        .metadata
        .owner_references
        .as_ref()
        .and_then(|refs| refs.first())
        .map(|owner| format!("{}/{}", owner.kind, owner.name));

    let mut result =
        AnalysisResult::new("Pod", qualified_name(&pod.metadata)).with_failures(failures);
    result.parent_object = parent;
    Some(result)
}

fn container_failure(container: &ContainerStatus) -> Option<String> {
    let waiting = container.state.as_ref()?.waiting.as_ref()?;
    let reason = waiting.reason.as_deref()?;
    if !ERROR_REASONS.contains(&reason) {
        return None;
    }
    let message = waiting.message.as_deref().unwrap_or("no message reported");
    Some(format!(
        "the container {} is in {} state: {}",
        container.name, reason, message
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        ContainerState, ContainerStateWaiting, PodCondition, PodStatus,
    };
    use kube::api::ObjectMeta;

    fn pod_with_status(status: PodStatus) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-7d9".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            status: Some(status),
            ..Default::default()
        }
    }

    fn waiting(name: &str, reason: &str) -> ContainerStatus {
        ContainerStatus {
            name: name.to_string(),
            state: Some(ContainerState {
                waiting: Some(ContainerStateWaiting {
                    reason: Some(reason.to_string()),
                    message: Some("back-off 5m0s".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_crash_looping_container_is_reported() {
        let pod = pod_with_status(PodStatus {
            phase: Some("Running".to_string()),
            container_statuses: Some(vec![waiting("app", "CrashLoopBackOff")]),
            ..Default::default()
        });

        let result = inspect_pod(&pod, &MaskKey::default()).unwrap();
        assert_eq!(result.kind, "Pod");
        assert_eq!(result.name, "shop/web-7d9");
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].text.contains("CrashLoopBackOff"));
        assert_eq!(result.failures[0].sensitive.len(), 2);
    }

    #[test]
    fn test_container_creating_is_not_a_failure() {
        let pod = pod_with_status(PodStatus {
            phase: Some("Pending".to_string()),
            container_statuses: Some(vec![waiting("app", "ContainerCreating")]),
            ..Default::default()
        });
        assert!(inspect_pod(&pod, &MaskKey::default()).is_none());
    }

    #[test]
    fn test_unschedulable_pod_is_reported() {
        let pod = pod_with_status(PodStatus {
            phase: Some("Pending".to_string()),
            conditions: Some(vec![PodCondition {
                type_: "PodScheduled".to_string(),
                status: "False".to_string(),
                reason: Some("Unschedulable".to_string()),
                message: Some("0/3 nodes are available".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        });

        let result = inspect_pod(&pod, &MaskKey::default()).unwrap();
        assert!(result.failures[0].text.contains("0/3 nodes are available"));
    }
}
