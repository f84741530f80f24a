// # DNS Provider Trait
//
// Defines the interface for listing and updating DNS records via a provider API.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `ddns-provider-aliyun` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records("example.com", Some("A")).await?;
//     for record in records.iter().filter(|r| r.rr == "home") {
//         provider.update_record(record, "203.0.113.7").await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::Deserialize;

/// A DNS record as returned by the provider
///
/// The engine only inspects `rr` (for matching) and echoes `record_id` and
/// `record_type` back on update. Everything else is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomainRecord {
    /// Provider-assigned record ID
    #[serde(rename = "RecordId")]
    pub record_id: String,

    /// Host label (e.g. "home" for "home.example.com", "@" for the apex)
    #[serde(rename = "RR")]
    pub rr: String,

    /// Record type (A, AAAA, CNAME, ...)
    #[serde(rename = "Type")]
    pub record_type: String,

    /// Record value
    #[serde(rename = "Value")]
    pub value: String,

    /// Time-to-live, when the provider reports it
    #[serde(rename = "TTL", default)]
    pub ttl: Option<u32>,
}

impl DomainRecord {
    /// Create a record (mostly useful for tests and embedding)
    pub fn new(
        record_id: impl Into<String>,
        rr: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            rr: rr.into(),
            record_type: record_type.into(),
            value: value.into(),
            ttl: None,
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoint only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (a run is a single best-effort attempt)
/// - ❌ Access the state store (owned by `DdnsEngine`)
/// - ❌ Decide which records to update (owned by `ResolutionUpdater`)
/// - ❌ Cache state beyond a single request
///
/// ## Error contract
///
/// - The provider answered with an error message → `Error::Provider`
/// - The request never got an answer → `Error::Network`
///
/// The updater relies on this split: provider rejections during the update
/// phase are reported per record, every other error ends the run.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of a domain
    ///
    /// # Parameters
    ///
    /// - `root_domain`: The registrable domain (e.g. "example.com")
    /// - `type_filter`: Optional record type keyword to narrow the listing
    async fn list_records(
        &self,
        root_domain: &str,
        type_filter: Option<&str>,
    ) -> Result<Vec<DomainRecord>, crate::Error>;

    /// Point an existing record at a new value
    ///
    /// `RecordId`, `RR` and `Type` are echoed from `record`.
    async fn update_record(
        &self,
        record: &DomainRecord,
        new_value: &str,
    ) -> Result<(), crate::Error>;

    /// Whether update calls are skipped (dry-run)
    fn is_dry_run(&self) -> bool {
        false
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
