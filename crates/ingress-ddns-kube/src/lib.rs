// # Kubernetes Ingress Lister
//
// This crate provides a `ResourceLister` over Kubernetes `networking.k8s.io/v1`
// Ingress objects.
//
// ## Behaviour
//
// - One `list` call per reconciliation pass, no watch and no cache
// - Optional namespace scope (default: all namespaces)
// - Optional server-side label selector
// - A 404 from the API server (e.g. the Ingress kind is not served) is
//   reported as `Error::NotFound`, which discovery treats as "no resources"
// - Every list call is bounded by a 30 second timeout

use async_trait::async_trait;
use ingress_ddns_core::traits::{AnnotatedResource, ResourceLister};
use ingress_ddns_core::{DiscoveryConfig, Error, Result};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Api, Client, api::ListParams};
use std::time::Duration;

/// Default timeout for one list call (30 seconds)
const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Lists Ingress resources and reduces them to their annotations
pub struct IngressLister {
    api: Api<Ingress>,
    namespace: Option<String>,
    label_selector: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for IngressLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngressLister")
            .field("namespace", &self.namespace)
            .field("label_selector", &self.label_selector)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IngressLister {
    /// Create a lister scoped by the discovery configuration
    ///
    /// Uses `config.namespace` (`None` lists all namespaces) and
    /// `config.label_selector` (e.g. `cloudflare-ddns/hostname`).
    pub fn new(client: Client, config: &DiscoveryConfig) -> Self {
        let namespace = config.namespace.clone();
        let label_selector = config.label_selector.clone();

        let api = match &namespace {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        };

        Self {
            api,
            namespace,
            label_selector,
            timeout: DEFAULT_LIST_TIMEOUT,
        }
    }

    /// Override the list timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn list_params(&self) -> ListParams {
        match &self.label_selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        }
    }
}

#[async_trait]
impl ResourceLister for IngressLister {
    async fn list(&self) -> Result<Vec<AnnotatedResource>> {
        let params = self.list_params();

        let ingresses = tokio::time::timeout(self.timeout, self.api.list(&params))
            .await
            .map_err(|_| {
                Error::hostname_source(format!("Ingress list timed out after {:?}", self.timeout))
            })?
            .map_err(map_kube_error)?;

        tracing::debug!(
            "Listed {} ingress(es) (namespace: {}, selector: {})",
            ingresses.items.len(),
            self.namespace.as_deref().unwrap_or("<all>"),
            self.label_selector.as_deref().unwrap_or("<none>")
        );

        Ok(ingresses.items.into_iter().map(to_annotated).collect())
    }
}

/// Reduce an Ingress to the fields discovery reads
fn to_annotated(ingress: Ingress) -> AnnotatedResource {
    let meta = ingress.metadata;

    AnnotatedResource {
        namespace: meta.namespace,
        name: meta.name.unwrap_or_default(),
        annotations: meta.annotations.unwrap_or_default(),
    }
}

/// Map a Kubernetes client error to the core error kinds
fn map_kube_error(err: kube::Error) -> Error {
    match &err {
        kube::Error::Api(api_err) if api_err.code == 404 => {
            Error::not_found(format!("Ingress resources: {}", api_err.message))
        }
        kube::Error::Api(api_err) if api_err.code == 401 || api_err.code == 403 => {
            Error::auth(format!("Ingress list denied: {}", api_err.message))
        }
        _ => Error::hostname_source(format!("Ingress list failed: {}", err)),
    }
}
