// # ingress-ddns-core
//
// Core library for ingress-driven dynamic DNS.
//
// ## Architecture Overview
//
// This library keeps DNS "A" records in line with hostnames declared on
// cluster ingress resources:
// - **HostnameSource**: Trait for enumerating hostnames to manage
// - **ResourceLister**: Trait for listing annotated cluster resources
// - **IpSource**: Trait for resolving the current public IP
// - **DnsRecordStore**: Trait for listing, creating and updating records
// - **Reconciler**: Decides create / update / skip per hostname
// - **Scheduler**: Runs the reconciler on a fixed delay, one pass at a time
//
// ## Ownership
//
// Records carry a comment. Only records whose comment is exactly
// [`MANAGED_MARKER`] are ever updated; anything else is reported and left
// untouched.

pub mod config;
pub mod discovery;
pub mod error;
pub mod hostname;
pub mod reconciler;
pub mod scheduler;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{DEFAULT_HOSTNAME_ANNOTATION, DiscoveryConfig, MANAGED_MARKER, ReconcilerConfig};
pub use discovery::AnnotationHostnameSource;
pub use error::{Error, Result};
pub use hostname::Hostname;
pub use reconciler::{PassSummary, ReconcileEvent, ReconcileOutcome, Reconciler};
pub use scheduler::Scheduler;
pub use store::MemoryRecordStore;
pub use traits::{
    AnnotatedResource, DnsRecord, DnsRecordStore, HostnameSource, IpSource, NewRecord,
    ResourceLister,
};
