// # HTTP IP Source
//
// This crate provides an HTTP-based public IP resolver for the ingress DDNS
// system.
//
// ## Architecture
//
// Fetches the current IP from plain-text "what is my IP" services (e.g.
// api.ipify.org, icanhazip.com). Services are tried in order and the first
// valid answer wins. Nothing is cached: every call to `current()` asks again,
// so each reconciliation pass sees a fresh address.

use ingress_ddns_core::traits::{IpSource, IpVersion};
use ingress_ddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default IP check services, tried in order
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",  // returns plain text IP
    "https://ifconfig.me/ip", // No rate limit documented
    "https://icanhazip.com",  // No rate limit documented
];

/// Default HTTP timeout per service (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP resolver
#[derive(Debug)]
pub struct HttpIpSource {
    /// URLs to fetch the IP from, in order of preference
    urls: Vec<String>,

    /// IP version to accept (None = both)
    version: Option<IpVersion>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `urls`: Services to query, in order (e.g. "https://api.ipify.org")
    /// - `version`: IP version to accept (None = both)
    pub fn new(urls: Vec<String>, version: Option<IpVersion>) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::config("At least one IP service URL is required"));
        }

        for url in &urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "IP service URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            urls,
            version,
            client,
        })
    }

    /// Create a source using [`DEFAULT_IP_SERVICES`]
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect(),
            None,
        )
    }

    /// Fetch the IP from one service
    async fn fetch_ip(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::provider("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::provider(
                "http",
                format!("HTTP error: {}", response.status()),
            ));
        }

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::provider("http", format!("Failed to read response: {}", e)))?;

        parse_ip(&ip_text, self.version)
    }
}

/// Parse a service response and check it against the version filter
fn parse_ip(text: &str, version: Option<IpVersion>) -> Result<IpAddr> {
    let text = text.trim();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::provider("http", format!("Invalid IP address: {}", text)))?;

    if ip.is_unspecified() {
        return Err(Error::provider(
            "http",
            format!("Unspecified IP address: {}", ip),
        ));
    }

    match version {
        Some(expected) if IpVersion::of(&ip) != expected => Err(Error::provider(
            "http",
            format!("Expected {:?}, got: {}", expected, ip),
        )),
        _ => Ok(ip),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let mut last_error = None;

        for url in &self.urls {
            match self.fetch_ip(url).await {
                Ok(ip) => {
                    tracing::debug!("Public IP {} (from {})", ip, url);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("IP lookup via {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::ip_source(format!(
            "All {} IP service(s) failed; last error: {}",
            self.urls.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn version(&self) -> Option<IpVersion> {
        self.version
    }
}
