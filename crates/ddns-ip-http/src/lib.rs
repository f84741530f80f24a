// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS updater.
//
// ## Architecture
//
// Asks an external "what is my IP" service (e.g. api.ipify.org,
// icanhazip.com) for the caller's public address. The service must answer
// with the bare address as plain text; surrounding whitespace is ignored.
//
// One run makes exactly one lookup: no polling, no caching, no failover.

use ddns_core::config::{DEFAULT_IP_SOURCE_URL, IpVersion};
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default HTTP timeout for the lookup (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// IP version accepted from the service
    version: IpVersion,

    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpIpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIpSource")
            .field("url", &self.url)
            .field("version", &self.version)
            .finish()
    }
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the IP from (e.g., "https://api.ipify.org")
    /// - `version`: IP version to accept (`Both` = no filtering)
    pub fn new(url: impl Into<String>, version: IpVersion) -> Result<Self> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::config(format!(
                "IP source URL must be an http(s) URL, got '{}'",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            version,
            client,
        })
    }

    /// Create a source against the default service, accepting any version
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_IP_SOURCE_URL, IpVersion::Both)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current IP from the HTTP service
    async fn fetch_ip(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} answered HTTP {}",
                self.url,
                response.status()
            )));
        }

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        let ip_text = ip_text.trim();

        let ip: IpAddr = ip_text
            .parse()
            .map_err(|_| Error::ip_source(format!("Invalid IP address: '{}'", ip_text)))?;

        if !self.version.accepts(&ip) {
            return Err(Error::ip_source(format!(
                "Expected {:?} address, got: {}",
                self.version, ip
            )));
        }

        Ok(ip)
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let ip = self.fetch_ip().await?;
        tracing::debug!("Public IP from {}: {}", self.url, ip);
        Ok(ip)
    }

    fn version(&self) -> IpVersion {
        self.version
    }
}
