//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Asking the IpSource for the current public IP
//! - Comparing it with the StateStore's last persisted IP
//! - Running the ResolutionUpdater when they differ
//! - Persisting the new IP after the updater completes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐
//! │  IpSource   │──▶│  DdnsEngine  │◀──── StateStore (get / set)
//! └─────────────┘   └──────────────┘
//!                          │
//!                          ▼
//!                ┌────────────────────┐      ┌─────────────┐
//!                │ ResolutionUpdater  │─────▶│ DnsProvider │
//!                └────────────────────┘      └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Fetch the current IP (rejected if outside the source's IP version)
//! 2. Read the last persisted IP
//! 3. If equal, stop (zero provider calls)
//! 4. Otherwise list records, update every match
//! 5. On success, persist the new IP (skipped in dry-run)
//!
//! A run is strictly sequential and makes a single best-effort attempt.

pub mod updater;

pub use updater::{RecordOutcome, RecordUpdate, ResolutionUpdater, UpdateReport};

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource, StateStore};
use std::net::IpAddr;
use tracing::{debug, info};

/// Outcome of one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The current IP matches the persisted one; nothing was sent
    Unchanged {
        /// The current IP address
        ip: IpAddr,
    },
    /// The updater ran and the new IP was persisted
    Updated {
        /// The new IP address
        ip: IpAddr,
        /// The previously persisted IP, if any
        previous_ip: Option<String>,
        /// Per-record outcomes
        report: UpdateReport,
    },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Call [`DdnsEngine::run_once()`] (typically once per scheduled invocation)
///
/// There is no internal loop: scheduling is left to the caller (cron, a
/// systemd timer, ...).
pub struct DdnsEngine {
    /// IP source for detecting the current address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// State store holding the last persisted IP
    state_store: Box<dyn StateStore>,

    /// Run configuration
    config: DdnsConfig,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `state_store`: State store implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// `Err(Error::Config)` if the configuration is invalid. No I/O is
    /// performed here.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            state_store,
            config,
        })
    }

    /// Run one update cycle
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome::Unchanged)`: IP unchanged, no provider call made
    /// - `Ok(RunOutcome::Updated)`: Records processed, new IP persisted
    /// - `Err(Error)`: The run aborted; the persisted IP is left untouched
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let current_ip = self.ip_source.current().await?;
        info!("Current IP: {}", current_ip);

        let version = self.ip_source.version();
        if !version.accepts(&current_ip) {
            return Err(Error::ip_source(format!(
                "IP source reported {} but is restricted to {:?}",
                current_ip, version
            )));
        }

        let current = current_ip.to_string();
        let last_ip = self.state_store.get_last_ip().await?;

        if last_ip.as_deref() == Some(current.as_str()) {
            info!("IP unchanged ({}), nothing to do", current);
            return Ok(RunOutcome::Unchanged { ip: current_ip });
        }

        debug!(
            "IP changed: {} -> {}",
            last_ip.as_deref().unwrap_or("None"),
            current
        );

        let report = self.updater().update(&current).await?;

        info!(
            "Processed {} record(s): {} updated, {} failed",
            report.records.len(),
            report.updated_count(),
            report.failed_count()
        );

        if self.provider.is_dry_run() {
            info!("[DRY-RUN] Not persisting {}", current);
        } else {
            self.state_store.set_last_ip(&current).await?;
        }

        Ok(RunOutcome::Updated {
            ip: current_ip,
            previous_ip: last_ip,
            report,
        })
    }

    /// Build the resolution updater for this engine's provider and settings
    pub fn updater(&self) -> ResolutionUpdater<'_> {
        ResolutionUpdater::new(
            self.provider.as_ref(),
            &self.config.settings,
            self.config.record_type_filter.as_deref(),
        )
    }

    /// The run configuration
    pub fn config(&self) -> &DdnsConfig {
        &self.config
    }
}
