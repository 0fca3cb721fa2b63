//! Ingress analyzer: ingresses that no controller will pick up.
//!
//! Not part of the default battery; enable it with `--filter Ingress`
//! or through `active_filters`.

use super::{Analyzer, AnalyzerConfig, AnalyzerError, object_sensitive, qualified_name};
use crate::analyzer::types::{AnalysisResult, Failure};
use crate::anonymize::MaskKey;
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::{Ingress, IngressClass};
use kube::api::{Api, ListParams};

const LEGACY_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

pub struct IngressAnalyzer;

#[async_trait]
impl Analyzer for IngressAnalyzer {
    fn name(&self) -> &str {
        "Ingress"
    }

    async fn analyze(&self, config: &AnalyzerConfig) -> Result<Vec<AnalysisResult>, AnalyzerError> {
        let classes: Api<IngressClass> = Api::all(config.client()?);
        let known: Vec<String> = classes
            .list(&ListParams::default())
            .await?
            .items
            .into_iter()
            .filter_map(|class| class.metadata.name)
            .collect();

        let ingresses = config.list::<Ingress>().await?;
        Ok(ingresses
            .iter()
            .filter_map(|ingress| inspect_ingress(ingress, &known, &config.mask_key))
            .collect())
    }
}

fn ingress_class(ingress: &Ingress) -> Option<String> {
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.ingress_class_name.clone())
        .or_else(|| {
            ingress
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(LEGACY_CLASS_ANNOTATION).cloned())
        })
}

fn inspect_ingress(
    ingress: &Ingress,
    known_classes: &[String],
    key: &MaskKey,
) -> Option<AnalysisResult> {
    let name = qualified_name(&ingress.metadata);
    let mut sensitive = object_sensitive(&ingress.metadata, key);

    let text = match ingress_class(ingress) {
        None => format!("Ingress {} does not specify an Ingress class", name),
        Some(class) if !known_classes.contains(&class) => {
            sensitive.push(key.sensitive(&class));
            format!("Ingress uses the ingress class {} which does not exist", class)
        }
        Some(_) => return None,
    };

    Some(AnalysisResult::new("Ingress", name).with_failures(vec![Failure {
        text,
        sensitive,
        ..Default::default()
    }]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::networking::v1::IngressSpec;
    use kube::api::ObjectMeta;

    fn ingress(class: Option<&str>) -> Ingress {
        Ingress {
            metadata: ObjectMeta {
                name: Some("storefront".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                ingress_class_name: class.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_class() {
        let result = inspect_ingress(&ingress(None), &[], &MaskKey::default()).unwrap();
        assert_eq!(
            result.failures[0].text,
            "Ingress shop/storefront does not specify an Ingress class"
        );
    }

    #[test]
    fn test_unknown_class() {
        let key = MaskKey::default();
        let known = vec!["nginx".to_string()];
        let result = inspect_ingress(&ingress(Some("traefik")), &known, &key).unwrap();
        assert!(result.failures[0].text.contains("traefik"));
        assert!(inspect_ingress(&ingress(Some("nginx")), &known, &key).is_none());
    }

    #[test]
    fn test_unknown_class_is_masked_with_the_object() {
        let key = MaskKey::new([9; 32]);
        let result = inspect_ingress(&ingress(Some("traefik")), &[], &key).unwrap();
        let failure = &result.failures[0];
        let unmasked: Vec<&str> = failure.sensitive.iter().map(|m| m.unmasked.as_str()).collect();
        assert_eq!(unmasked, vec!["shop", "storefront", "traefik"]);

        let masked = crate::anonymize::Redactor::for_failure(failure).mask(&failure.text);
        assert!(!masked.contains("traefik"));
    }
}
