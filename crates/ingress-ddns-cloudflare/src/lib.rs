// # Cloudflare DNS Record Store
//
// This crate provides a Cloudflare implementation of `DnsRecordStore`.
//
// ## Behaviour
//
// - One HTTP request per trait call (list, create or update)
// - No retry, backoff or caching: a failed call is reported and the next
//   reconciliation pass tries again
// - HTTP timeout of 30 seconds on every request
// - Specific error mapping for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - Dry-run mode: list requests are sent, create/update are only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ingress_ddns_core::traits::{DnsRecord, DnsRecordStore, NewRecord, RECORD_TYPE_A};
use ingress_ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare API response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

/// Cloudflare DNS record store
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform list requests
/// - Log the intended create/update payload
/// - **NOT** actually modify DNS records
pub struct CloudflareRecordStore {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform list requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRecordStore")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareRecordStore {
    /// Create a new Cloudflare record store
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform list requests but skip writes
    ///
    /// # Errors
    ///
    /// Fails if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();

        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        if dry_run {
            tracing::warn!("Cloudflare store running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Point the store at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    /// Send a request and unwrap the Cloudflare envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(map_status(status, &error_text, context));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider("cloudflare", format!("Failed to parse response: {}", e))
        })?;

        if !envelope.success {
            let messages = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::provider(
                "cloudflare",
                format!("{} rejected: {}", context, messages),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider("cloudflare", "Invalid response format: missing result")
        })
    }

    fn dry_run_record(id: &str, record: &NewRecord) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            content: record.content.clone(),
            ttl: record.ttl,
            proxied: record.proxied,
            comment: Some(record.comment.clone()),
        }
    }
}

/// Map a non-success HTTP status to an error
fn map_status(status: StatusCode, error_text: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, error_text)),
        409 => Error::provider(
            "cloudflare",
            format!(
                "Conflict: Record is being updated by another process. Status: {}",
                status
            ),
        ),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("{} failed: {} - {}", context, status, error_text),
        ),
    }
}

#[async_trait]
impl DnsRecordStore for CloudflareRecordStore {
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=app.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn list_by_name(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Listing {} records named {}", RECORD_TYPE_A, name);

        let request = self
            .client
            .get(self.records_url(zone_id))
            .query(&[("type", RECORD_TYPE_A), ("name", name)]);

        let records: Vec<DnsRecord> = self.send(request, "Record lookup").await?;
        tracing::debug!("Found {} record(s) named {}", records.len(), name);
        Ok(records)
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "A", "name": "app", "content": "1.2.3.4", "ttl": 1,
    ///   "proxied": true, "comment": "Created from kubernetes" }
    /// ```
    async fn create(&self, zone_id: &str, record: &NewRecord) -> Result<DnsRecord> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.records_url(zone_id),
                serde_json::to_string(record)?
            );
            return Ok(Self::dry_run_record("dry-run", record));
        }

        let request = self.client.post(self.records_url(zone_id)).json(record);
        let created: DnsRecord = self.send(request, "Record creation").await?;

        tracing::debug!("Created record {} ({})", created.name, created.id);
        Ok(created)
    }

    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// { "type": "A", "name": "app", "content": "1.2.3.4", "ttl": 1,
    ///   "proxied": true, "comment": "Created from kubernetes" }
    /// ```
    async fn update(&self, zone_id: &str, id: &str, record: &NewRecord) -> Result<DnsRecord> {
        let url = format!("{}/{}", self.records_url(zone_id), id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(record)?
            );
            return Ok(Self::dry_run_record(id, record));
        }

        let request = self.client.put(&url).json(record);
        let updated: DnsRecord = self.send(request, "Record update").await?;

        tracing::debug!("Updated record {} ({})", updated.name, updated.id);
        Ok(updated)
    }

    fn store_name(&self) -> &'static str {
        "cloudflare"
    }
}
