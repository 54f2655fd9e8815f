// # DNS Record Store Trait
//
// Defines the interface for reading and writing address records at a DNS
// provider.
//
// ## Implementations
//
// - Cloudflare: `ingress-ddns-cloudflare` crate
// - In-memory: [`crate::store::MemoryRecordStore`]
//
// ## Usage
//
// ```rust,ignore
// use ingress_ddns_core::{DnsRecordStore, NewRecord, MANAGED_MARKER};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* DnsRecordStore implementation */;
//
//     let existing = store.list_by_name("zone-id", "app.example.com").await?;
//     if existing.is_empty() {
//         let record = NewRecord::managed("app", "203.0.113.5".parse()?);
//         store.create("zone-id", &record).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// The only record type this system manages
pub const RECORD_TYPE_A: &str = "A";

/// "Automatic" TTL
pub const TTL_AUTO: u32 = 1;

/// A DNS record as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier (opaque)
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type (e.g. "A")
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content (the address, as text)
    pub content: String,
    /// Time-to-live; 1 means automatic
    pub ttl: u32,
    /// Whether traffic is proxied by the provider
    #[serde(default)]
    pub proxied: bool,
    /// Free-text comment; holds [`crate::MANAGED_MARKER`] for records we own
    #[serde(default)]
    pub comment: Option<String>,
}

impl DnsRecord {
    /// Whether this record carries the managed marker exactly
    pub fn is_managed(&self) -> bool {
        self.comment.as_deref() == Some(crate::config::MANAGED_MARKER)
    }

    /// Whether the record content equals `ip` in its canonical text form
    pub fn points_to(&self, ip: IpAddr) -> bool {
        self.content == ip.to_string()
    }
}

/// The body of a create or update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Record name; the subdomain label, expanded by the provider within the zone
    pub name: String,
    /// Record type (always "A")
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record content (the address, as text)
    pub content: String,
    /// Time-to-live; always automatic
    pub ttl: u32,
    /// Proxied flag; always true
    pub proxied: bool,
    /// Comment; always the managed marker
    pub comment: String,
}

impl NewRecord {
    /// Build the record body the reconciler writes for `name` pointing at `ip`
    pub fn managed(name: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            name: name.into(),
            record_type: RECORD_TYPE_A.to_string(),
            content: ip.to_string(),
            ttl: TTL_AUTO,
            proxied: true,
            comment: crate::config::MANAGED_MARKER.to_string(),
        }
    }

    /// Body for pointing an existing managed record at `ip`
    ///
    /// Keeps the record's proxied flag and TTL.
    pub fn repointed(existing: &DnsRecord, name: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            ttl: existing.ttl,
            proxied: existing.proxied,
            ..Self::managed(name, ip)
        }
    }
}

/// Trait for DNS record store implementations
///
/// Stores are thin adapters: one provider call per method, no retries, no
/// caching, no decisions about whether a write is needed. All of that is
/// owned by the [`crate::Reconciler`].
#[async_trait]
pub trait DnsRecordStore: Send + Sync {
    /// List records with exactly this fully-qualified name in the zone
    ///
    /// Ordering is as returned by the provider. An empty vector means no
    /// record exists; it is not an error.
    async fn list_by_name(&self, zone_id: &str, name: &str)
    -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record in the zone
    async fn create(&self, zone_id: &str, record: &NewRecord) -> Result<DnsRecord, crate::Error>;

    /// Overwrite the record with identifier `id`
    async fn update(
        &self,
        zone_id: &str,
        id: &str,
        record: &NewRecord,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
