//! Annotation-driven hostname discovery
//!
//! [`AnnotationHostnameSource`] reads hostnames from resource annotations
//! produced by any [`ResourceLister`]:
//!
//! 1. List resources (a "not found" error means there are none)
//! 2. Drop resources lacking the marker annotation, if one is configured
//! 3. Read the hostname annotation; resources without it are skipped
//! 4. Normalise each entry relative to the TLD and deduplicate

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::hostname::Hostname;
use crate::traits::{HostnameSource, ResourceLister};

/// Hostname source backed by resource annotations
pub struct AnnotationHostnameSource {
    lister: Box<dyn ResourceLister>,
    hostname_annotation: String,
    marker_annotation: Option<String>,
    tld: String,
}

impl AnnotationHostnameSource {
    /// Create a hostname source reading annotations from `lister`
    pub fn new(
        lister: Box<dyn ResourceLister>,
        config: &DiscoveryConfig,
        tld: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            lister,
            hostname_annotation: config.hostname_annotation.clone(),
            marker_annotation: config.marker_annotation.clone(),
            tld: tld.into(),
        })
    }
}

#[async_trait]
impl HostnameSource for AnnotationHostnameSource {
    async fn list(&self) -> Result<Vec<Hostname>> {
        let resources = match self.lister.list().await {
            Ok(resources) => resources,
            Err(e) if e.is_not_found() => {
                info!("No annotated resources found in the cluster");
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::hostname_source(e.to_string())),
        };

        debug!("Listed {} resource(s)", resources.len());

        let mut seen = HashSet::new();
        let mut hostnames = Vec::new();

        for resource in resources {
            let resource_name = resource.qualified_name();

            if let Some(marker) = &self.marker_annotation
                && !resource.annotations.contains_key(marker)
            {
                debug!("Resource {} lacks marker annotation {}, skipping", resource_name, marker);
                continue;
            }

            let Some(value) = resource.annotations.get(&self.hostname_annotation) else {
                info!(
                    "Resource {} has no {} annotation, skipping",
                    resource_name, self.hostname_annotation
                );
                continue;
            };

            let (parsed, rejected) = Hostname::parse_annotation(value, &self.tld);

            for e in rejected {
                warn!("Ignoring hostname on resource {}: {}", resource_name, e);
            }

            for hostname in parsed {
                if seen.insert(hostname.clone()) {
                    hostnames.push(hostname);
                } else {
                    debug!("Hostname {} already discovered, skipping duplicate", hostname);
                }
            }
        }

        Ok(hostnames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::AnnotatedResource;
    use std::collections::BTreeMap;

    struct StaticLister(std::result::Result<Vec<AnnotatedResource>, fn() -> Error>);

    #[async_trait]
    impl ResourceLister for StaticLister {
        async fn list(&self) -> Result<Vec<AnnotatedResource>> {
            match &self.0 {
                Ok(resources) => Ok(resources.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn resource(name: &str, annotations: &[(&str, &str)]) -> AnnotatedResource {
        AnnotatedResource {
            namespace: Some("default".to_string()),
            name: name.to_string(),
            annotations: annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn source(lister: StaticLister, marker: Option<&str>) -> AnnotationHostnameSource {
        let config = DiscoveryConfig {
            marker_annotation: marker.map(str::to_string),
            ..DiscoveryConfig::default()
        };
        AnnotationHostnameSource::new(Box::new(lister), &config, "example.com").unwrap()
    }

    const HOST: &str = crate::config::DEFAULT_HOSTNAME_ANNOTATION;

    #[tokio::test]
    async fn test_reads_hostname_annotation() {
        let lister = StaticLister(Ok(vec![
            resource("web", &[(HOST, "app")]),
            resource("api", &[(HOST, "api.example.com")]),
        ]));

        let hostnames = source(lister, None).list().await.unwrap();
        let labels: Vec<&str> = hostnames.iter().map(Hostname::label).collect();
        assert_eq!(labels, vec!["app", "api"]);
    }

    #[tokio::test]
    async fn test_skips_resources_without_annotation() {
        let lister = StaticLister(Ok(vec![
            resource("plain", &[("other", "x")]),
            resource("web", &[(HOST, "app")]),
        ]));

        let hostnames = source(lister, None).list().await.unwrap();
        assert_eq!(hostnames.len(), 1);
    }

    #[tokio::test]
    async fn test_marker_annotation_filters() {
        let lister = StaticLister(Ok(vec![
            resource("unmarked", &[(HOST, "app")]),
            resource("marked", &[(HOST, "www"), ("ddns/enabled", "")]),
        ]));

        let hostnames = source(lister, Some("ddns/enabled")).list().await.unwrap();
        let labels: Vec<&str> = hostnames.iter().map(Hostname::label).collect();
        assert_eq!(labels, vec!["www"]);
    }

    #[tokio::test]
    async fn test_duplicates_are_collapsed() {
        let lister = StaticLister(Ok(vec![
            resource("a", &[(HOST, "app")]),
            resource("b", &[(HOST, "app.example.com,www")]),
        ]));

        let hostnames = source(lister, None).list().await.unwrap();
        let labels: Vec<&str> = hostnames.iter().map(Hostname::label).collect();
        assert_eq!(labels, vec!["app", "www"]);
    }

    #[tokio::test]
    async fn test_not_found_is_empty() {
        let lister = StaticLister(Err(|| Error::not_found("ingresses")));
        let hostnames = source(lister, None).list().await.unwrap();
        assert!(hostnames.is_empty());
    }

    #[tokio::test]
    async fn test_other_failures_surface() {
        let lister = StaticLister(Err(|| Error::http("connection refused")));
        let err = source(lister, None).list().await.unwrap_err();
        assert!(matches!(err, Error::HostnameSource(_)));
    }
}
