//! Test doubles and common utilities for the update flow contract tests
//!
//! These doubles count every call so tests can assert on the exact number of
//! provider requests a run makes.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DomainRecord, IpSource};
use ddns_core::{DdnsConfig, IpVersion, Settings};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource that always reports the same address
pub struct FixedIpSource {
    ip: IpAddr,
    version: IpVersion,
    calls: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            version: IpVersion::Both,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Claim to report only `version` addresses (whatever `ip` is)
    pub fn with_version(mut self, version: IpVersion) -> Self {
        self.version = version;
        self
    }
}

#[async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn version(&self) -> IpVersion {
        self.version
    }
}

/// An IpSource that always fails
pub struct FailingIpSource;

#[async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::ip_source("lookup service unreachable"))
    }
}

/// How the mock answers an update for a given record ID
#[derive(Debug, Clone)]
pub enum UpdateBehavior {
    Reject(String),
    NetworkFailure,
}

/// Call counters shared between a MockDnsProvider and the test
#[derive(Debug, Default)]
pub struct ProviderCalls {
    pub list_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub listed_domains: Mutex<Vec<(String, Option<String>)>>,
    pub updates: Mutex<Vec<(DomainRecord, String)>>,
}

impl ProviderCalls {
    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.list_count() + self.update_count()
    }

    pub fn updated_ids(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.record_id.clone())
            .collect()
    }
}

/// A scripted DnsProvider
pub struct MockDnsProvider {
    records: Vec<DomainRecord>,
    list_error: Option<String>,
    update_behavior: HashMap<String, UpdateBehavior>,
    dry_run: bool,
    calls: Arc<ProviderCalls>,
}

impl MockDnsProvider {
    pub fn with_records(records: Vec<DomainRecord>) -> Self {
        Self {
            records,
            list_error: None,
            update_behavior: HashMap::new(),
            dry_run: false,
            calls: Arc::new(ProviderCalls::default()),
        }
    }

    /// Listing answers with a provider message
    pub fn rejecting_list(message: &str) -> Self {
        let mut provider = Self::with_records(Vec::new());
        provider.list_error = Some(message.to_string());
        provider
    }

    pub fn on_update(mut self, record_id: &str, behavior: UpdateBehavior) -> Self {
        self.update_behavior.insert(record_id.to_string(), behavior);
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn calls(&self) -> Arc<ProviderCalls> {
        self.calls.clone()
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(
        &self,
        root_domain: &str,
        type_filter: Option<&str>,
    ) -> Result<Vec<DomainRecord>> {
        self.calls.list_calls.fetch_add(1, Ordering::SeqCst);
        self.calls
            .listed_domains
            .lock()
            .unwrap()
            .push((root_domain.to_string(), type_filter.map(str::to_string)));

        match &self.list_error {
            Some(message) => Err(Error::provider_with_code("mock", message, message)),
            None => Ok(self.records.clone()),
        }
    }

    async fn update_record(&self, record: &DomainRecord, new_value: &str) -> Result<()> {
        self.calls.update_calls.fetch_add(1, Ordering::SeqCst);
        self.calls
            .updates
            .lock()
            .unwrap()
            .push((record.clone(), new_value.to_string()));

        match self.update_behavior.get(&record.record_id) {
            Some(UpdateBehavior::Reject(message)) => Err(Error::provider("mock", message)),
            Some(UpdateBehavior::NetworkFailure) => Err(Error::network("connection reset")),
            None => Ok(()),
        }
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

pub fn settings(domain: &str) -> Settings {
    Settings::new("test-key-id", "test-key-secret", domain)
}

pub fn config(domain: &str) -> DdnsConfig {
    DdnsConfig::new(settings(domain))
}

/// Records of example.com: two for "sub" (A and AAAA), one for "other"
pub fn mixed_records() -> Vec<DomainRecord> {
    vec![
        DomainRecord::new("1001", "sub", "A", "198.51.100.1"),
        DomainRecord::new("1002", "other", "A", "198.51.100.1"),
        DomainRecord::new("1003", "sub", "AAAA", "2001:db8::1"),
    ]
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}
