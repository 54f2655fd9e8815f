// # ingress-ddnsd - Ingress DDNS Daemon
//
// Thin integration layer: reads configuration from the environment, wires the
// Kubernetes lister, the HTTP IP resolver and the Cloudflare record store into
// the core reconciler, and runs the reconcile loop until SIGINT/SIGTERM.
// All reconciliation logic lives in ingress-ddns-core.
//
// ## Configuration
//
// ### Required
// - `DNS_API_TOKEN`: Cloudflare API token (Zone:DNS:Edit)
// - `DNS_ZONE_ID`: Cloudflare zone identifier
// - `MANAGED_TLD`: Domain appended to every discovered hostname
//
// ### Optional
// - `DDNS_INTERVAL_SECS`: Delay between passes (default 60, 10..=3600)
// - `DDNS_HOSTNAME_ANNOTATION`: Annotation holding the hostname
//   (default `external-dns.alpha.kubernetes.io/hostname`)
// - `DDNS_MARKER_ANNOTATION`: Only consider Ingresses carrying this annotation
// - `DDNS_LABEL_SELECTOR`: Server-side label selector for Ingresses
// - `DDNS_NAMESPACE`: Namespace to watch (default: all)
// - `DDNS_IP_SOURCE_URLS`: Comma-separated IP services, tried in order
// - `DDNS_IP_VERSION`: v4 (default) or both; A records only ever receive IPv4
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// Cluster credentials come from the in-cluster service account or the local
// kubeconfig.
//
// ## Example
//
// ```bash
// export DNS_API_TOKEN=...
// export DNS_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export MANAGED_TLD=example.com
// export DDNS_LABEL_SELECTOR=cloudflare-ddns/hostname
//
// ingress-ddnsd
// ```

use anyhow::{Context, Result};
use ingress_ddns_cloudflare::CloudflareRecordStore;
use ingress_ddns_core::traits::IpVersion;
use ingress_ddns_core::{
    AnnotationHostnameSource, DEFAULT_HOSTNAME_ANNOTATION, DiscoveryConfig, ReconcileEvent,
    Reconciler, ReconcilerConfig, Scheduler,
};
use ingress_ddns_ip_http::{DEFAULT_IP_SERVICES, HttpIpSource};
use ingress_ddns_kube::IngressLister;
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_token: String,
    zone_id: String,
    tld: String,
    interval_secs: u64,
    hostname_annotation: String,
    marker_annotation: Option<String>,
    label_selector: Option<String>,
    namespace: Option<String>,
    ip_source_urls: Vec<String>,
    ip_version: Option<IpVersion>,
    dry_run: bool,
    log_level: String,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("tld", &self.tld)
            .field("interval_secs", &self.interval_secs)
            .field("hostname_annotation", &self.hostname_annotation)
            .field("marker_annotation", &self.marker_annotation)
            .field("label_selector", &self.label_selector)
            .field("namespace", &self.namespace)
            .field("ip_source_urls", &self.ip_source_urls)
            .field("ip_version", &self.ip_version)
            .field("dry_run", &self.dry_run)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset and blank are treated the same
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            optional(key).with_context(|| {
                format!("{} is required. Set it via: export {}=<value>", key, key)
            })
        };

        let interval_secs = match optional("DDNS_INTERVAL_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DDNS_INTERVAL_SECS must be an integer. Got: {}", raw))?,
            None => 60,
        };

        let ip_version = match optional("DDNS_IP_VERSION").as_deref() {
            None | Some("v4") => Some(IpVersion::V4),
            Some("both") => None,
            Some(other) => anyhow::bail!(
                "DDNS_IP_VERSION '{}' is not valid. Valid values: v4, both \
                (managed records are type A)",
                other
            ),
        };

        let dry_run = match optional("DDNS_MODE").as_deref() {
            None | Some("live") => false,
            Some("dry-run") => true,
            Some(other) => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid values: live, dry-run",
                other
            ),
        };

        let ip_source_urls = match optional("DDNS_IP_SOURCE_URLS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            api_token: required("DNS_API_TOKEN")?,
            zone_id: required("DNS_ZONE_ID")?,
            tld: required("MANAGED_TLD")?.to_lowercase(),
            interval_secs,
            hostname_annotation: optional("DDNS_HOSTNAME_ANNOTATION")
                .unwrap_or_else(|| DEFAULT_HOSTNAME_ANNOTATION.to_string()),
            marker_annotation: optional("DDNS_MARKER_ANNOTATION"),
            label_selector: optional("DDNS_LABEL_SELECTOR"),
            namespace: optional("DDNS_NAMESPACE"),
            ip_source_urls,
            ip_version,
            dry_run,
            log_level: optional("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        // Cloudflare API tokens are 40 characters
        if self.api_token.len() < 20 {
            anyhow::bail!(
                "DNS_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters. \
                Verify your token is correct.",
                self.api_token.len()
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DNS_API_TOKEN appears to be a placeholder. \
                Use an actual API token from Cloudflare."
            );
        }

        if !(10..=3600).contains(&self.interval_secs) {
            anyhow::bail!(
                "DDNS_INTERVAL_SECS must be between 10 and 3600 seconds. Got: {}",
                self.interval_secs
            );
        }

        if self.ip_source_urls.is_empty() {
            anyhow::bail!("DDNS_IP_SOURCE_URLS must contain at least one URL");
        }

        for url in &self.ip_source_urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!(
                    "DDNS_IP_SOURCE_URLS must use HTTP or HTTPS scheme. Got: {}",
                    url
                );
            }
        }

        self.reconciler_config()
            .validate()
            .context("Invalid DNS_ZONE_ID / MANAGED_TLD")?;
        self.discovery_config()
            .validate()
            .context("Invalid discovery settings")?;

        parse_log_level(&self.log_level)?;

        Ok(())
    }

    fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig::new(&self.zone_id, &self.tld).with_interval_secs(self.interval_secs)
    }

    fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            hostname_annotation: self.hostname_annotation.clone(),
            marker_annotation: self.marker_annotation.clone(),
            label_selector: self.label_selector.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ingress-ddnsd");
    debug!("Configuration: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let (scheduler, events) = match build_scheduler(&config).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        match run_daemon(scheduler, events).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Wire the collaborators into a scheduler
async fn build_scheduler(config: &Config) -> Result<(Scheduler, mpsc::Receiver<ReconcileEvent>)> {
    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client (no in-cluster or kubeconfig credentials)")?;

    let discovery = config.discovery_config();
    let lister = IngressLister::new(client, &discovery);
    let hostnames = AnnotationHostnameSource::new(Box::new(lister), &discovery, &config.tld)?;

    let ip_source = HttpIpSource::new(config.ip_source_urls.clone(), config.ip_version)?;
    let store = CloudflareRecordStore::new(config.api_token.clone(), config.dry_run)?;

    let reconciler_config = config.reconciler_config();
    let (reconciler, events) = Reconciler::new(
        Box::new(hostnames),
        Box::new(ip_source),
        Box::new(store),
        &reconciler_config,
    )?;

    info!(
        "Managing ingress hostnames under {} (zone {}, every {}s{})",
        config.tld,
        config.zone_id,
        config.interval_secs,
        if config.dry_run { ", dry-run" } else { "" }
    );

    Ok((Scheduler::new(reconciler, reconciler_config.interval()), events))
}

/// Run the reconcile loop until a shutdown signal arrives
async fn run_daemon(scheduler: Scheduler, events: mpsc::Receiver<ReconcileEvent>) -> Result<()> {
    // Handlers are installed before the first pass so a signal during it is not lost
    let shutdown = shutdown_signal()?;

    let drain = tokio::spawn(log_events(events));

    scheduler.run_until(shutdown).await?;

    drop(scheduler);
    let _ = drain.await;

    info!("Shutting down daemon");
    Ok(())
}

/// Trace reconcile events; pass summaries are already logged by the reconciler
async fn log_events(mut events: mpsc::Receiver<ReconcileEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ReconcileEvent::PassAborted { reason } => debug!("Pass aborted: {}", reason),
            other => debug!("Reconcile event: {:?}", other),
        }
    }
}

/// Install SIGTERM and SIGINT handlers and return a future resolving on either
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Fallback for non-Unix platforms (SIGINT only)
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal: SIGINT");
    })
}
