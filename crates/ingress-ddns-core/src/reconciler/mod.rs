//! Core reconciler
//!
//! The Reconciler is responsible for:
//! - Discovering hostnames via HostnameSource
//! - Resolving the current public IP via IpSource
//! - Deciding, per hostname, whether to create, update or skip its record
//! - Refusing to touch records it did not create
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌─────────────┐
//! │ HostnameSource │   │  IpSource   │
//! └────────────────┘   └─────────────┘
//!          │                  │
//!          └────────┬─────────┘
//!                   ▼
//!           ┌──────────────┐
//!           │  Reconciler  │──── ReconcileEvent ───▶ (monitoring)
//!           └──────────────┘
//!                   │
//!                   ▼
//!          ┌────────────────┐
//!          │ DnsRecordStore │
//!          │ list / create  │
//!          │ / update       │
//!          └────────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. List hostnames (a listing failure yields an empty set for this pass)
//! 2. Resolve the public IP (a failure aborts the pass before any write)
//! 3. For each hostname, independently: list records by FQDN, decide, act
//! 4. Emit a summary; no error crosses the pass boundary

pub mod decision;

use chrono::{DateTime, Utc};
use std::net::IpAddr;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::hostname::Hostname;
use crate::traits::{DnsRecordStore, HostnameSource, IpSource, NewRecord, RECORD_TYPE_A};

pub use decision::{Decision, decide};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// A pass started
    PassStarted {
        hostnames_count: usize,
    },

    /// A record was created
    RecordCreated {
        hostname: String,
        record_id: String,
        new_ip: IpAddr,
    },

    /// A managed record was updated
    RecordUpdated {
        hostname: String,
        record_id: String,
        previous_content: String,
        new_ip: IpAddr,
    },

    /// The record already had the current IP
    RecordUnchanged {
        hostname: String,
        current_ip: IpAddr,
    },

    /// The record is stale but not managed by this system
    RecordNotManaged {
        hostname: String,
        record_id: String,
    },

    /// Reconciling a hostname failed
    ReconcileFailed {
        hostname: String,
        error: String,
    },

    /// The pass was abandoned before touching any record
    PassAborted {
        reason: String,
    },

    /// A pass finished
    PassCompleted {
        summary: PassSummary,
    },
}

/// Outcome of reconciling one hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new record was created
    Created { record_id: String },
    /// An existing managed record was pointed at the current IP
    Updated {
        record_id: String,
        previous_content: String,
    },
    /// Nothing to do
    Unchanged,
    /// The record exists, is stale and lacks the managed marker
    NotManaged { record_id: String },
}

/// Counters for one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// The IP used for this pass, if it could be resolved
    pub ip: Option<IpAddr>,
    /// Number of hostnames discovered
    pub hostnames: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub not_managed: usize,
    pub failed: usize,
    /// Whether the pass stopped before reconciling any hostname
    pub aborted: bool,
}

impl PassSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ip: None,
            hostnames: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            not_managed: 0,
            failed: 0,
            aborted: false,
        }
    }

    /// Number of create/update calls that succeeded
    pub fn mutations(&self) -> usize {
        self.created + self.updated
    }

    fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Created { .. } => self.created += 1,
            ReconcileOutcome::Updated { .. } => self.updated += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
            ReconcileOutcome::NotManaged { .. } => self.not_managed += 1,
        }
    }
}

/// Core reconciler
///
/// Holds its collaborators and read-only configuration; nothing else is
/// shared. Every operation is sequential: hostnames are processed one after
/// another and no two store mutations run concurrently.
pub struct Reconciler {
    /// Source of hostnames to manage
    hostnames: Box<dyn HostnameSource>,

    /// Resolver for the current public IP
    ip_source: Box<dyn IpSource>,

    /// DNS record store
    store: Box<dyn DnsRecordStore>,

    /// Zone all records live in
    zone_id: String,

    /// Domain appended to every hostname for lookups
    tld: String,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconcile events
    pub fn new(
        hostnames: Box<dyn HostnameSource>,
        ip_source: Box<dyn IpSource>,
        store: Box<dyn DnsRecordStore>,
        config: &ReconcilerConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            hostnames,
            ip_source,
            store,
            zone_id: config.zone_id.clone(),
            tld: config.tld.trim_end_matches('.').to_string(),
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Run one full reconciliation pass
    ///
    /// Never fails: every error is logged and reflected in the summary.
    pub async fn run_pass(&self) -> PassSummary {
        let mut summary = PassSummary::new(Utc::now());

        let hostnames = match self.hostnames.list().await {
            Ok(hostnames) => hostnames,
            Err(e) => {
                error!("Failed to list hostnames: {}", e);
                Vec::new()
            }
        };
        summary.hostnames = hostnames.len();

        self.emit_event(ReconcileEvent::PassStarted {
            hostnames_count: hostnames.len(),
        });

        if hostnames.is_empty() {
            debug!("No hostnames to reconcile");
            return self.finish(summary);
        }

        let ip = match self.ip_source.current().await {
            Ok(ip) => match check_writable(ip) {
                Ok(()) => ip,
                Err(reason) => {
                    return self.abort(summary, format!("IP source returned {}", reason));
                }
            },
            Err(e) => {
                return self.abort(summary, format!("Couldn't get public IP address: {}", e));
            }
        };
        debug!("Current public IP: {}", ip);

        self.reconcile_into(&hostnames, ip, &mut summary).await;
        self.finish(summary)
    }

    /// Reconcile every hostname against `ip`
    ///
    /// A failure on one hostname does not prevent processing the rest.
    pub async fn reconcile_all(&self, hostnames: &[Hostname], ip: IpAddr) -> PassSummary {
        let mut summary = PassSummary::new(Utc::now());
        summary.hostnames = hostnames.len();

        if let Err(reason) = check_writable(ip) {
            return self.abort(summary, format!("Refusing to write {}", reason));
        }

        self.reconcile_into(hostnames, ip, &mut summary).await;
        self.finish(summary)
    }

    async fn reconcile_into(&self, hostnames: &[Hostname], ip: IpAddr, summary: &mut PassSummary) {
        summary.ip = Some(ip);

        for hostname in hostnames {
            match self.reconcile_hostname(hostname, ip).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Failed to reconcile {}: {}", hostname, e);
                    summary.failed += 1;
                    self.emit_event(ReconcileEvent::ReconcileFailed {
                        hostname: hostname.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Reconcile the record for a single hostname
    ///
    /// 1. List records named `hostname.tld` in the zone
    /// 2. None → create; first one matches → skip; first one stale →
    ///    update if it carries the managed marker, otherwise refuse
    pub async fn reconcile_hostname(&self, hostname: &Hostname, ip: IpAddr) -> Result<ReconcileOutcome> {
        if let Err(reason) = check_writable(ip) {
            return Err(Error::invalid_input(format!(
                "Refusing to write {} for {}",
                reason, hostname
            )));
        }

        let fqdn = hostname.fqdn(&self.tld);
        let records = self.store.list_by_name(&self.zone_id, &fqdn).await?;

        if records.len() > 1 {
            warn!(
                "{} records share the name {}; only the first one returned by {} is considered",
                records.len(),
                fqdn,
                self.store.store_name()
            );
        }

        match decide(records.first(), ip) {
            Decision::Create => {
                let body = NewRecord::managed(hostname.label(), ip);
                let created = self.store.create(&self.zone_id, &body).await?;

                info!("Created dns entry for {} -> {}", hostname, ip);
                self.emit_event(ReconcileEvent::RecordCreated {
                    hostname: hostname.to_string(),
                    record_id: created.id.clone(),
                    new_ip: ip,
                });
                Ok(ReconcileOutcome::Created {
                    record_id: created.id,
                })
            }
            Decision::Unchanged(_) => {
                debug!("Record {} already has IP {}, skipping update", fqdn, ip);
                self.emit_event(ReconcileEvent::RecordUnchanged {
                    hostname: hostname.to_string(),
                    current_ip: ip,
                });
                Ok(ReconcileOutcome::Unchanged)
            }
            Decision::Update(existing) => {
                let body = NewRecord::repointed(existing, hostname.label(), ip);
                self.store.update(&self.zone_id, &existing.id, &body).await?;

                info!(
                    "Updated dns entry for {} -> {} (was: {})",
                    hostname, ip, existing.content
                );
                self.emit_event(ReconcileEvent::RecordUpdated {
                    hostname: hostname.to_string(),
                    record_id: existing.id.clone(),
                    previous_content: existing.content.clone(),
                    new_ip: ip,
                });
                Ok(ReconcileOutcome::Updated {
                    record_id: existing.id.clone(),
                    previous_content: existing.content.clone(),
                })
            }
            Decision::NotManaged(existing) => {
                warn!("Domain not managed by ddns: {}", fqdn);
                self.emit_event(ReconcileEvent::RecordNotManaged {
                    hostname: hostname.to_string(),
                    record_id: existing.id.clone(),
                });
                Ok(ReconcileOutcome::NotManaged {
                    record_id: existing.id.clone(),
                })
            }
        }
    }

    fn abort(&self, mut summary: PassSummary, reason: String) -> PassSummary {
        error!("{}; skipping all updates this pass", reason);
        summary.aborted = true;
        self.emit_event(ReconcileEvent::PassAborted { reason });
        self.finish(summary)
    }

    fn finish(&self, summary: PassSummary) -> PassSummary {
        info!(
            "Pass complete: {} hostname(s), {} created, {} updated, {} unchanged, {} not managed, {} failed",
            summary.hostnames,
            summary.created,
            summary.updated,
            summary.unchanged,
            summary.not_managed,
            summary.failed
        );
        self.emit_event(ReconcileEvent::PassCompleted {
            summary: summary.clone(),
        });
        summary
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// Whether `ip` may be written into an A record
fn check_writable(ip: IpAddr) -> std::result::Result<(), String> {
    if ip.is_unspecified() {
        return Err(format!("unspecified address {}", ip));
    }
    if !ip.is_ipv4() {
        return Err(format!("non-IPv4 address {} (records are type {})", ip, RECORD_TYPE_A));
    }
    Ok(())
}
