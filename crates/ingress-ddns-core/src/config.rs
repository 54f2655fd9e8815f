//! Configuration types for the ingress DDNS system
//!
//! Configuration is built once at startup (the daemon reads it from the
//! environment) and passed by reference into the reconciler.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Comment stored on every record this system creates
///
/// Its exact presence is the only signal that a record may be mutated.
pub const MANAGED_MARKER: &str = "Created from kubernetes";

/// Default annotation holding the target hostname
pub const DEFAULT_HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/hostname";

/// Reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// DNS provider zone identifier
    pub zone_id: String,

    /// Top-level domain appended to every discovered hostname
    pub tld: String,

    /// Delay between the end of one pass and the start of the next (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the reconcile event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ReconcilerConfig {
    /// Create a configuration with default interval and channel capacity
    pub fn new(zone_id: impl Into<String>, tld: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            tld: tld.into(),
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the pass interval
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// The pass interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID cannot be empty"));
        }

        let tld = self.tld.trim_end_matches('.');
        crate::hostname::validate_domain_name(tld)
            .map_err(|e| crate::Error::config(format!("Invalid TLD '{}': {}", self.tld, e)))?;

        if self.interval_secs == 0 {
            return Err(crate::Error::config("Reconcile interval must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

/// Which resources the hostname source reads, and from which annotations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Annotation whose value holds the target hostname(s)
    #[serde(default = "default_hostname_annotation")]
    pub hostname_annotation: String,

    /// Optional marker annotation; when set, only resources carrying it are considered
    #[serde(default)]
    pub marker_annotation: Option<String>,

    /// Optional server-side label selector
    #[serde(default)]
    pub label_selector: Option<String>,

    /// Optional namespace; `None` means all namespaces
    #[serde(default)]
    pub namespace: Option<String>,
}

impl DiscoveryConfig {
    /// Validate the discovery configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.hostname_annotation.trim().is_empty() {
            return Err(crate::Error::config("Hostname annotation key cannot be empty"));
        }

        if let Some(marker) = &self.marker_annotation
            && marker.trim().is_empty()
        {
            return Err(crate::Error::config(
                "Marker annotation key cannot be empty when set",
            ));
        }

        Ok(())
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            hostname_annotation: default_hostname_annotation(),
            marker_annotation: None,
            label_selector: None,
            namespace: None,
        }
    }
}

fn default_hostname_annotation() -> String {
    DEFAULT_HOSTNAME_ANNOTATION.to_string()
}

fn default_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    1000
}
