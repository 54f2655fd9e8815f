//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles record every collaborator call so tests can assert on the
//! exact number and shape of store mutations.

#![allow(dead_code)]

use ingress_ddns_core::error::{Error, Result};
use ingress_ddns_core::traits::{DnsRecord, DnsRecordStore, HostnameSource, IpSource, NewRecord};
use ingress_ddns_core::{Hostname, MANAGED_MARKER, MemoryRecordStore, ReconcilerConfig};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE: &str = "zone-123";
pub const TLD: &str = "example.com";

/// A store call, as observed by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { zone_id: String, name: String },
    Create { zone_id: String, record: NewRecord },
    Update { zone_id: String, id: String, record: NewRecord },
}

/// A MemoryRecordStore wrapper that logs calls and can fail on demand
#[derive(Clone)]
pub struct RecordingStore {
    inner: MemoryRecordStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryRecordStore::new(TLD),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Seed a record directly, bypassing the call log
    pub async fn seed(&self, id: &str, label: &str, content: &str, comment: &str) {
        self.inner
            .insert(
                ZONE,
                DnsRecord {
                    id: id.to_string(),
                    name: format!("{}.{}", label, TLD),
                    record_type: "A".to_string(),
                    content: content.to_string(),
                    ttl: 1,
                    proxied: true,
                    comment: Some(comment.to_string()),
                },
            )
            .await;
    }

    /// Seed an arbitrary record, bypassing the call log
    pub async fn seed_record(&self, record: DnsRecord) {
        self.inner.insert(ZONE, record).await;
    }

    /// Make every call for this fully-qualified name fail
    pub fn fail_on(&self, fqdn: &str) {
        self.failing_names.lock().unwrap().insert(fqdn.to_string());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, StoreCall::List { .. }))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub async fn records(&self) -> Vec<DnsRecord> {
        self.inner.records(ZONE).await
    }

    fn check(&self, fqdn: &str) -> Result<()> {
        if self.failing_names.lock().unwrap().contains(fqdn) {
            return Err(Error::provider("recording", format!("injected failure for {}", fqdn)));
        }
        Ok(())
    }

    fn fqdn(name: &str) -> String {
        if name.ends_with(TLD) {
            name.to_string()
        } else {
            format!("{}.{}", name, TLD)
        }
    }
}

#[async_trait::async_trait]
impl DnsRecordStore for RecordingStore {
    async fn list_by_name(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        self.calls.lock().unwrap().push(StoreCall::List {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
        });
        self.check(name)?;
        self.inner.list_by_name(zone_id, name).await
    }

    async fn create(&self, zone_id: &str, record: &NewRecord) -> Result<DnsRecord> {
        self.calls.lock().unwrap().push(StoreCall::Create {
            zone_id: zone_id.to_string(),
            record: record.clone(),
        });
        self.check(&Self::fqdn(&record.name))?;
        self.inner.create(zone_id, record).await
    }

    async fn update(&self, zone_id: &str, id: &str, record: &NewRecord) -> Result<DnsRecord> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            zone_id: zone_id.to_string(),
            id: id.to_string(),
            record: record.clone(),
        });
        self.check(&Self::fqdn(&record.name))?;
        self.inner.update(zone_id, id, record).await
    }

    fn store_name(&self) -> &'static str {
        "recording"
    }
}

/// An IP source whose answer the test can change between passes
#[derive(Clone)]
pub struct SwitchableIpSource {
    ip: Arc<Mutex<Option<IpAddr>>>,
    call_count: Arc<AtomicUsize>,
}

impl SwitchableIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip: Arc::new(Mutex::new(Some(ip))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An IP source that always fails
    pub fn failing() -> Self {
        Self {
            ip: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, ip: IpAddr) {
        *self.ip.lock().unwrap() = Some(ip);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for SwitchableIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let ip = *self.ip.lock().unwrap();
        ip.ok_or_else(|| Error::ip_source("network unreachable"))
    }
}

/// A hostname source returning a fixed list (or a fixed failure)
#[derive(Clone)]
pub struct StaticHostnames {
    hostnames: Option<Vec<Hostname>>,
    call_count: Arc<AtomicUsize>,
}

impl StaticHostnames {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            hostnames: Some(labels.iter().map(|l| Hostname::new(*l).unwrap()).collect()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            hostnames: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HostnameSource for StaticHostnames {
    async fn list(&self) -> Result<Vec<Hostname>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.hostnames
            .clone()
            .ok_or_else(|| Error::hostname_source("the server is currently unable to handle the request"))
    }
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn hostname(label: &str) -> Hostname {
    Hostname::new(label).unwrap()
}

pub fn test_config() -> ReconcilerConfig {
    ReconcilerConfig::new(ZONE, TLD)
}

pub fn managed(label: &str, ip: IpAddr) -> NewRecord {
    let record = NewRecord::managed(label, ip);
    assert_eq!(record.comment, MANAGED_MARKER);
    record
}
