//! Node analyzer: nodes that are not Ready or report resource pressure.

use super::{Analyzer, AnalyzerConfig, AnalyzerError};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::Api;

pub struct NodeAnalyzer;

#[async_trait]
impl Analyzer for NodeAnalyzer {
    fn name(&self) -> &str {
        "Node"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        // nodes are cluster scoped, the namespace filter does not apply
        let nodes: Api<Node> = Api::all(config.client()?);
        let list = nodes.list(&config.list_params()).await?;
        Ok(list
            .items
            .iter()
            .filter_map(|node| inspect_node(node, &config.mask_key))
            .collect())
    }
}

fn inspect_node(node: &Node, key: &MaskKey) -> Option<AnalysisResult> {
    let name = node.metadata.name.clone().unwrap_or_default();
    let conditions = node.status.as_ref()?.conditions.as_ref()?;

    let failures: Vec<Failure> = conditions
        .iter()
        .filter(|c| {
            if c.type_ == "Ready" {
                c.status != "True"
            } else {
                // MemoryPressure, DiskPressure, PIDPressure, NetworkUnavailable
                c.status == "True"
            }
        })
        .map(|c| Failure {
            text: format!(
                "{} has condition of type {}, reason {}: {}",
                name,
                c.type_,
                c.reason.as_deref().unwrap_or_default(),
                c.message.as_deref().unwrap_or_default()
            ),
            sensitive: vec![key.sensitive(&name)],
            ..Default::default()
        })
        .collect();

    if failures.is_empty() {
        return None;
    }
    Some(AnalysisResult::new("Node", name).with_failures(failures))
}
