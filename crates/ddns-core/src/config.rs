//! Configuration types for the DDNS updater
//!
//! This module defines the provider credentials ([`Settings`]), the
//! domain-splitting rule ([`DomainParts`]) and the per-run configuration
//! ([`DdnsConfig`]) handed to the engine.

use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;

use crate::Error;

/// Default Alibaba Cloud DNS API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://alidns.aliyuncs.com/";

/// Default public IP detection service (plain-text response)
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org";

/// Default location of the persisted last IP
pub const DEFAULT_STATE_PATH: &str = "ip.txt";

/// Provider credentials and the managed domain
///
/// Loaded once per run and never mutated afterwards.
///
/// # Security
///
/// The Debug implementation does NOT expose the access secret.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// AccessKey ID
    pub access_key: String,
    /// AccessKey secret
    /// ⚠️ NEVER log this value
    pub access_secret: String,
    /// Fully-qualified domain name to keep updated (e.g. "home.example.com")
    pub domain: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("access_key", &self.access_key)
            .field("access_secret", &"<REDACTED>")
            .field("domain", &self.domain)
            .finish()
    }
}

impl Settings {
    /// Create settings from their parts
    pub fn new(
        access_key: impl Into<String>,
        access_secret: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            access_secret: access_secret.into(),
            domain: domain.into(),
        }
    }

    /// Parse settings from a JSON document
    ///
    /// ```json
    /// { "access_key": "LTAI...", "access_secret": "...", "domain": "home.example.com" }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a JSON settings file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), Error> {
        if self.access_key.is_empty() {
            return Err(Error::config("access_key cannot be empty"));
        }
        if self.access_secret.is_empty() {
            return Err(Error::config("access_secret cannot be empty"));
        }
        if self.domain.is_empty() {
            return Err(Error::config("domain cannot be empty"));
        }
        self.domain_parts().map(|_| ())
    }

    /// Split the configured domain into host label and root domain
    pub fn domain_parts(&self) -> Result<DomainParts, Error> {
        DomainParts::split(&self.domain)
    }
}

/// A domain split into its first label and everything after it
///
/// `sub.example.com` splits into `pre_domain = "sub"` and
/// `root_domain = "example.com"`.
///
/// Only the first label is peeled off: `a.b.example.com` yields
/// `pre_domain = "a"` and `root_domain = "b.example.com"`, which does not
/// match how the provider models records for multi-level host names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    /// Registrable domain used to scope the record listing
    pub root_domain: String,
    /// Host label matched against each record's RR field
    pub pre_domain: String,
}

impl DomainParts {
    /// Split a fully-qualified domain name on its first dot
    pub fn split(domain: &str) -> Result<Self, Error> {
        let (pre, root) = domain
            .split_once('.')
            .ok_or_else(|| Error::config(format!("Domain has no subdomain label: {}", domain)))?;

        if pre.is_empty() || root.is_empty() {
            return Err(Error::config(format!("Invalid domain name: {}", domain)));
        }

        Ok(Self {
            root_domain: root.to_string(),
            pre_domain: pre.to_string(),
        })
    }
}

/// IP version accepted from the IP source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
    /// Both IPv4 and IPv6
    #[default]
    Both,
}

impl IpVersion {
    /// Whether an address of this family is accepted
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
            IpVersion::Both => true,
        }
    }
}

impl std::str::FromStr for IpVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v4" | "ipv4" => Ok(IpVersion::V4),
            "v6" | "ipv6" => Ok(IpVersion::V6),
            "both" => Ok(IpVersion::Both),
            other => Err(Error::config(format!(
                "Unknown IP version '{}'. Valid: v4, v6, both",
                other
            ))),
        }
    }
}

/// Per-run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DdnsConfig {
    /// Provider credentials and managed domain
    pub settings: Settings,

    /// Provider API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// URL of the public IP detection service
    #[serde(default = "default_ip_source_url")]
    pub ip_source_url: String,

    /// IP version accepted from the IP source
    #[serde(default)]
    pub ip_version: IpVersion,

    /// Path of the persisted last-IP file
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Optional record type filter sent with the listing (`TypeKeyWord`)
    #[serde(default)]
    pub record_type_filter: Option<String>,

    /// List records but skip the update calls
    #[serde(default)]
    pub dry_run: bool,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the settings
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            endpoint: default_endpoint(),
            ip_source_url: default_ip_source_url(),
            ip_version: IpVersion::default(),
            state_path: default_state_path(),
            record_type_filter: None,
            dry_run: false,
        }
    }

    /// Set the record type filter
    pub fn with_record_type_filter(mut self, record_type: impl Into<String>) -> Self {
        self.record_type_filter = Some(record_type.into());
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        self.settings.validate()?;

        if self.endpoint.is_empty() {
            return Err(Error::config("Provider endpoint cannot be empty"));
        }
        if self.ip_source_url.is_empty() {
            return Err(Error::config("IP source URL cannot be empty"));
        }
        if self.state_path.is_empty() {
            return Err(Error::config("State path cannot be empty"));
        }
        if let Some(filter) = &self.record_type_filter
            && filter.is_empty()
        {
            return Err(Error::config("Record type filter cannot be empty when set"));
        }

        Ok(())
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_ip_source_url() -> String {
    DEFAULT_IP_SOURCE_URL.to_string()
}

fn default_state_path() -> String {
    DEFAULT_STATE_PATH.to_string()
}
