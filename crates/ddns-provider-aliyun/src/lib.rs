// # Alibaba Cloud DNS Provider
//
// `DnsProvider` implementation for the Alibaba Cloud DNS (alidns) RPC API.
//
// ## Behavior
//
// - One HTTP request per trait call, no retries, no caching
// - Every request is signed (HMAC-SHA1, SignatureVersion 1.0) with a fresh
//   nonce and a timestamp later than the previous request's
// - Listing uses GET with the parameters in the query string
// - Updates use POST with the parameters as a form body
// - A JSON body with a non-empty `Message` is a provider rejection,
//   whatever the HTTP status
// - Transport failures (DNS, connect, TLS, timeout) are network errors
// - Dry-run mode performs the listing but never sends an update
//
// ## Security Requirements
//
// - The access secret NEVER appears in logs or Debug output
// - The access key and secret MUST be non-empty
//
// ## API Reference
//
// - DescribeDomainRecords: <https://help.aliyun.com/document_detail/29776.html>
// - UpdateDomainRecord: <https://help.aliyun.com/document_detail/29774.html>

pub mod request;
pub mod sign;
pub mod types;

pub use request::{CommonParams, RequestBuilder, RequestParams, SignedRequest};
pub use sign::HttpMethod;

use async_trait::async_trait;
use ddns_core::config::DEFAULT_ENDPOINT;
use ddns_core::traits::{DnsProvider, DomainRecord};
use ddns_core::{Error, Result, Settings};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::types::{ApiError, DescribeDomainRecordsResponse, UpdateDomainRecordResponse};

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "aliyun";

/// Page size requested from DescribeDomainRecords (the API maximum)
pub const LIST_PAGE_SIZE: u32 = 500;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout (10 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Alibaba Cloud DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform the record listing
/// - Log each intended update
/// - **NOT** send `UpdateDomainRecord`
///
/// # Security
///
/// The Debug implementation does NOT expose the access secret.
pub struct AliyunProvider {
    /// Signs every outgoing request
    requests: RequestBuilder,

    /// API endpoint
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list records but skip updates
    dry_run: bool,
}

impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("requests", &self.requests)
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl AliyunProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `settings`: Credentials (the domain is not used by the provider)
    /// - `endpoint`: API endpoint, e.g. `https://alidns.aliyuncs.com/`
    /// - `dry_run`: If true, list records but skip updates
    ///
    /// # Errors
    ///
    /// `Error::Config` when a credential is empty, the endpoint is not an
    /// http(s) URL, or the HTTP client cannot be built.
    pub fn new(settings: &Settings, endpoint: impl Into<String>, dry_run: bool) -> Result<Self> {
        if settings.access_key.trim().is_empty() {
            return Err(Error::config("Alibaba Cloud access key cannot be empty"));
        }
        if settings.access_secret.trim().is_empty() {
            return Err(Error::config("Alibaba Cloud access secret cannot be empty"));
        }

        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::config(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            requests: RequestBuilder::new(settings),
            endpoint,
            client,
            dry_run,
        })
    }

    /// Create a provider against the public endpoint (live mode)
    pub fn new_live(settings: &Settings) -> Result<Self> {
        Self::new(settings, DEFAULT_ENDPOINT, false)
    }

    /// Create a provider against the public endpoint (dry-run mode)
    pub fn new_dry_run(settings: &Settings) -> Result<Self> {
        Self::new(settings, DEFAULT_ENDPOINT, true)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sign and send one request, returning the decoded success body
    ///
    /// The body is decoded as JSON regardless of the HTTP status, since
    /// error responses carry `Code` and `Message` fields.
    async fn call<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        action_params: RequestParams,
    ) -> Result<T> {
        let request = self
            .requests
            .build_signed_request(method, action_params)
            .await;
        let action = request.action().to_string();

        tracing::debug!(action = %action, method = %method, "Calling Alibaba Cloud DNS");

        let builder = match method {
            HttpMethod::Get => self.client.get(&self.endpoint).query(&request.params),
            HttpMethod::Post => self.client.post(&self.endpoint).form(&request.params),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Error::network(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("{} response could not be read: {}", action, e)))?;

        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("{} returned a non-JSON body (HTTP {}): {}", action, status, e),
            )
        })?;

        let api_error = ApiError::deserialize(&json).unwrap_or_default();
        if let Some(message) = api_error.message() {
            tracing::debug!(
                action = %action,
                status = %status,
                request_id = api_error.request_id.as_deref().unwrap_or("-"),
                "Alibaba Cloud DNS rejected the request"
            );
            return Err(match api_error.code.as_deref() {
                Some(code) if !code.is_empty() => {
                    Error::provider_with_code(PROVIDER_NAME, code, message)
                }
                _ => Error::provider(PROVIDER_NAME, message),
            });
        }

        if !status.is_success() {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{} failed with HTTP {}", action, status),
            ));
        }

        serde_json::from_value(json).map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("{} returned an unexpected body: {}", action, e),
            )
        })
    }
}

fn params<const N: usize>(pairs: [(&str, &str); N]) -> RequestParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    /// ```http
    /// GET /?Action=DescribeDomainRecords&DomainName=example.com&PageSize=500[&TypeKeyWord=A]&...
    /// ```
    async fn list_records(
        &self,
        root_domain: &str,
        type_filter: Option<&str>,
    ) -> Result<Vec<DomainRecord>> {
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut action_params = params([
            ("Action", "DescribeDomainRecords"),
            ("DomainName", root_domain),
            ("PageSize", page_size.as_str()),
        ]);
        if let Some(record_type) = type_filter {
            action_params.insert("TypeKeyWord".to_string(), record_type.to_string());
        }

        let response: DescribeDomainRecordsResponse =
            self.call(HttpMethod::Get, action_params).await?;
        let records = response.domain_records.record;

        if let Some(total) = response.total_count
            && total > records.len() as u64
        {
            tracing::warn!(
                "{} has {} records but only {} were returned; records past the first page are not updated",
                root_domain,
                total,
                records.len()
            );
        }

        tracing::debug!("Listed {} records of {}", records.len(), root_domain);
        Ok(records)
    }

    /// ```http
    /// POST /
    /// Action=UpdateDomainRecord&RecordId=...&RR=...&Type=...&Value=...&...
    /// ```
    async fn update_record(&self, record: &DomainRecord, new_value: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would update record {} ({} {}) to {}",
                record.record_id,
                record.rr,
                record.record_type,
                new_value
            );
            return Ok(());
        }

        let action_params = params([
            ("Action", "UpdateDomainRecord"),
            ("RecordId", record.record_id.as_str()),
            ("RR", record.rr.as_str()),
            ("Type", record.record_type.as_str()),
            ("Value", new_value),
        ]);

        let response: UpdateDomainRecordResponse =
            self.call(HttpMethod::Post, action_params).await?;

        tracing::debug!(
            "UpdateDomainRecord accepted (record {}, request {})",
            response.record_id.as_deref().unwrap_or(&record.record_id),
            response.request_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
