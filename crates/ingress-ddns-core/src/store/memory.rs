// # Memory Record Store
//
// In-memory implementation of DnsRecordStore.
//
// ## Purpose
//
// Behaves like a single-provider record store without any network access:
// relative names are expanded under the configured domain, identifiers are
// assigned on create, and listing returns records in insertion order.
//
// ## When to Use
//
// - Testing the reconciler end to end
// - Local runs where no provider credentials are available

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::record_store::{DnsRecord, DnsRecordStore, NewRecord};

/// In-memory record store implementation
///
/// Records are kept per zone in a `Vec` protected by a RwLock, so listing
/// preserves insertion order (like a provider returning its own ordering).
///
/// # Example
///
/// ```rust,no_run
/// use ingress_ddns_core::store::MemoryRecordStore;
/// use ingress_ddns_core::traits::{DnsRecordStore, NewRecord};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new("example.com");
///
///     let body = NewRecord::managed("app", "203.0.113.5".parse()?);
///     store.create("zone", &body).await?;
///
///     let records = store.list_by_name("zone", "app.example.com").await?;
///     assert_eq!(records.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    domain: String,
    inner: Arc<RwLock<HashMap<String, Vec<DnsRecord>>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryRecordStore {
    /// Create an empty store whose zones all live under `domain`
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().trim_end_matches('.').to_string(),
            inner: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Insert a record as-is (for seeding externally managed records)
    pub async fn insert(&self, zone_id: &str, record: DnsRecord) {
        let mut guard = self.inner.write().await;
        guard.entry(zone_id.to_string()).or_default().push(record);
    }

    /// Snapshot of all records in a zone
    pub async fn records(&self, zone_id: &str) -> Vec<DnsRecord> {
        let guard = self.inner.read().await;
        guard.get(zone_id).cloned().unwrap_or_default()
    }

    /// Get the number of records in a zone
    pub async fn len(&self, zone_id: &str) -> usize {
        self.inner.read().await.get(zone_id).map_or(0, Vec::len)
    }

    /// Check if a zone has no records
    pub async fn is_empty(&self, zone_id: &str) -> bool {
        self.len(zone_id).await == 0
    }

    /// Expand a relative name under the store's domain
    fn expand(&self, name: &str) -> String {
        let name = name.trim_end_matches('.');
        if name == self.domain || name.ends_with(&format!(".{}", self.domain)) {
            name.to_string()
        } else {
            format!("{}.{}", name, self.domain)
        }
    }

    fn materialize(&self, id: String, record: &NewRecord) -> DnsRecord {
        DnsRecord {
            id,
            name: self.expand(&record.name),
            record_type: record.record_type.clone(),
            content: record.content.clone(),
            ttl: record.ttl,
            proxied: record.proxied,
            comment: Some(record.comment.clone()),
        }
    }
}

#[async_trait]
impl DnsRecordStore for MemoryRecordStore {
    async fn list_by_name(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(zone_id)
            .map(|records| records.iter().filter(|r| r.name == name).cloned().collect())
            .unwrap_or_default())
    }

    async fn create(&self, zone_id: &str, record: &NewRecord) -> Result<DnsRecord, Error> {
        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = self.materialize(id, record);

        let mut guard = self.inner.write().await;
        guard
            .entry(zone_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update(&self, zone_id: &str, id: &str, record: &NewRecord) -> Result<DnsRecord, Error> {
        let updated = self.materialize(id.to_string(), record);

        let mut guard = self.inner.write().await;
        let slot = guard
            .get_mut(zone_id)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Error::not_found(format!("DNS record not found: {}", id)))?;

        *slot = updated.clone();
        Ok(updated)
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[tokio::test]
    async fn test_create_expands_name() {
        let store = MemoryRecordStore::new("example.com");
        let ip: IpAddr = "203.0.113.5".parse().unwrap();

        let created = store.create("zone", &NewRecord::managed("app", ip)).await.unwrap();
        assert_eq!(created.name, "app.example.com");
        assert!(created.is_managed());

        let listed = store.list_by_name("zone", "app.example.com").await.unwrap();
        assert_eq!(listed, vec![created]);
        assert!(store.list_by_name("other-zone", "app.example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_preserves_id() {
        let store = MemoryRecordStore::new("example.com");
        let old: IpAddr = "203.0.113.5".parse().unwrap();
        let new: IpAddr = "203.0.113.9".parse().unwrap();

        let created = store.create("zone", &NewRecord::managed("app", old)).await.unwrap();
        let updated = store
            .update("zone", &created.id, &NewRecord::managed("app", new))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.content, "203.0.113.9");
        assert_eq!(store.len("zone").await, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryRecordStore::new("example.com");
        let ip: IpAddr = "203.0.113.5".parse().unwrap();

        let err = store
            .update("zone", "missing", &NewRecord::managed("app", ip))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
