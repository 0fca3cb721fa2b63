//! Service analyzer: selectors that match no ready endpoints.

use super::{Analyzer, AnalyzerConfig, AnalyzerError, object_sensitive, qualified_name};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::api::Api;
use std::collections::BTreeMap;

pub struct ServiceAnalyzer;

#[async_trait]
impl Analyzer for ServiceAnalyzer {
    fn name(&self) -> &str {
        "Service"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let client = config.client()?;
        let services = config.list::<Service>().await?;
        let mut results = Vec::new();

        for service in &services {
            let Some(selector) = selector_of(service) else {
                continue;
            };
            let namespace = service.metadata.namespace.as_deref().unwrap_or("default");
            let name = service.metadata.name.as_deref().unwrap_or_default();

            let endpoints: Api<Endpoints> = Api::namespaced(client.clone(), namespace);
            let ready = match endpoints.get_opt(name).await {
                Ok(found) => found.map(|ep| ready_addresses(&ep)).unwrap_or(0),
                // keep what was found for the services already checked
                Err(err) => {
                    return Err(AnalyzerError::Partial {
                        results,
                        source: Box::new(err.into()),
                    });
                }
            };

            if ready == 0 {
                results.push(no_endpoints_result(service, selector, &config.mask_key));
            }
        }

        Ok(results)
    }
}

fn selector_of(service: &Service) -> Option<&BTreeMap<String, String>> {
    service
        .spec
        .as_ref()?
        .selector
        .as_ref()
        .filter(|selector| !selector.is_empty())
}

fn ready_addresses(endpoints: &Endpoints) -> usize {
    endpoints
        .subsets
        .iter()
        .flatten()
        .map(|subset| subset.addresses.as_ref().map_or(0, Vec::len))
        .sum()
}

fn no_endpoints_result(
    service: &Service,
    selector: &BTreeMap<String, String>,
    key: &MaskKey,
) -> AnalysisResult {
    let mut sensitive = object_sensitive(&service.metadata, key);
    let labels: Vec<String> = selector
        .iter()
        .map(|(label, value)| {
            sensitive.push(key.sensitive(label));
            sensitive.push(key.sensitive(value));
            format!("{}={}", label, value)
        })
        .collect();

    let failure = Failure {
        text: format!(
            "Service has no endpoints, expected label {}",
            labels.join(", ")
        ),
        sensitive,
        ..Default::default()
    };
    AnalysisResult::new("Service", qualified_name(&service.metadata)).with_failures(vec![failure])
}
