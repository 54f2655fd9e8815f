//! Core traits for the ingress DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current public IP
//! - [`DnsRecordStore`]: List, create and update DNS records
//! - [`HostnameSource`]: Enumerate hostnames to manage
//! - [`ResourceLister`]: List annotated orchestration resources

pub mod hostname_source;
pub mod ip_source;
pub mod record_store;

pub use hostname_source::{AnnotatedResource, HostnameSource, ResourceLister};
pub use ip_source::{IpSource, IpVersion};
pub use record_store::{DnsRecord, DnsRecordStore, NewRecord, RECORD_TYPE_A, TTL_AUTO};
