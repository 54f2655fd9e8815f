// # Hostname Source Traits
//
// Two seams sit between the reconciler and the orchestration platform:
//
// - [`ResourceLister`]: lists annotated resources (Kubernetes Ingresses in
//   `ingress-ddns-kube`)
// - [`HostnameSource`]: turns whatever it reads into the hostnames to manage
//
// The reconciler depends only on `HostnameSource`, so it has no compile-time
// dependency on any orchestration client library.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::hostname::Hostname;

/// A listed resource, reduced to what discovery needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedResource {
    /// Namespace, if the resource is namespaced
    pub namespace: Option<String>,
    /// Resource name
    pub name: String,
    /// Resource annotations
    pub annotations: BTreeMap<String, String>,
}

impl AnnotatedResource {
    /// `namespace/name`, or just `name` for cluster-scoped resources
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// Trait for listing annotated resources
#[async_trait]
pub trait ResourceLister: Send + Sync {
    /// List resources matching the lister's configured filter
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<AnnotatedResource>)`: The resources (possibly empty)
    /// - `Err(Error::NotFound)`: Nothing of this kind exists; treated as empty
    /// - `Err(Error)`: Any other failure
    async fn list(&self) -> Result<Vec<AnnotatedResource>, crate::Error>;
}

/// Trait for producing the hostnames to reconcile
#[async_trait]
pub trait HostnameSource: Send + Sync {
    /// List the hostnames to manage in this pass
    ///
    /// An error is logged by the reconciler and the pass proceeds with an
    /// empty hostname set.
    async fn list(&self) -> Result<Vec<Hostname>, crate::Error>;
}
