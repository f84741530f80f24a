//! Resolution updater
//!
//! Drives the two provider calls of an update:
//!
//! ```text
//! LOAD_SETTINGS ──▶ LIST_RECORDS ──▶ MATCH ──▶ UPDATE ──▶ DONE
//!                        │                        │
//!                        └──────── ABORT ◀────────┘ (transport failure)
//! ```
//!
//! - A provider error while listing aborts the run before any update.
//! - During UPDATE, a provider rejection is recorded for that record and the
//!   remaining matches are still processed.
//! - Zero matching records is a valid outcome; no record is created.

use tracing::{debug, error, info, warn};

use crate::config::{DomainParts, Settings};
use crate::error::Result;
use crate::traits::{DnsProvider, DomainRecord};

/// Outcome of a single record update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The provider accepted the new value
    Updated,
    /// The provider rejected the update
    Failed {
        /// Provider message
        message: String,
    },
    /// Dry-run: the update was not sent
    Skipped,
}

/// Result of updating one matched record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// The record as listed by the provider
    pub record: DomainRecord,
    /// What happened to it
    pub outcome: RecordOutcome,
}

/// Report of one resolution update pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// One entry per matched record, in listing order
    pub records: Vec<RecordUpdate>,
}

impl UpdateReport {
    /// Number of records the provider accepted
    pub fn updated_count(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Updated))
    }

    /// Number of records the provider rejected
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }

    /// Whether no record matched the host label
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Updates every record matching the configured host label
pub struct ResolutionUpdater<'a> {
    provider: &'a dyn DnsProvider,
    settings: &'a Settings,
    type_filter: Option<&'a str>,
}

impl<'a> ResolutionUpdater<'a> {
    /// Create an updater
    ///
    /// # Parameters
    ///
    /// - `provider`: Provider used for both the listing and the updates
    /// - `settings`: Credentials and managed domain
    /// - `type_filter`: Optional record type keyword sent with the listing
    pub fn new(
        provider: &'a dyn DnsProvider,
        settings: &'a Settings,
        type_filter: Option<&'a str>,
    ) -> Self {
        Self {
            provider,
            settings,
            type_filter,
        }
    }

    /// Point every matching record at `new_ip`
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateReport)`: All matches processed (some may have failed)
    /// - `Err(Error::Config)`: The domain cannot be split; nothing was sent
    /// - `Err(Error::Provider)`: The listing was rejected; no update was sent
    /// - `Err(Error::Network)`: A transport failure ended the run
    pub async fn update(&self, new_ip: &str) -> Result<UpdateReport> {
        let DomainParts {
            root_domain,
            pre_domain,
        } = self.settings.domain_parts()?;

        info!("Listing records of {} for host '{}'", root_domain, pre_domain);
        let records = match self.provider.list_records(&root_domain, self.type_filter).await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to list records of {}: {}", root_domain, e);
                return Err(e);
            }
        };
        debug!("Provider returned {} record(s)", records.len());

        let mut report = UpdateReport::default();
        for record in records.into_iter().filter(|r| r.rr == pre_domain) {
            let outcome = self.update_one(&record, new_ip).await?;
            report.records.push(RecordUpdate { record, outcome });
        }

        if report.is_empty() {
            debug!("No record with RR '{}' under {}", pre_domain, root_domain);
        }

        Ok(report)
    }

    async fn update_one(&self, record: &DomainRecord, new_ip: &str) -> Result<RecordOutcome> {
        if self.provider.is_dry_run() {
            info!(
                "[DRY-RUN] Would update record {} ({} {}) -> {}",
                record.record_id, record.rr, record.record_type, new_ip
            );
            return Ok(RecordOutcome::Skipped);
        }

        match self.provider.update_record(record, new_ip).await {
            Ok(()) => {
                info!(
                    "Update resolution successfully: {} {} -> {}",
                    record.rr, record.record_type, new_ip
                );
                Ok(RecordOutcome::Updated)
            }
            Err(e) if e.is_provider_rejection() => {
                warn!(
                    "Update resolution failed: {} {}: {}",
                    record.rr, record.record_type, e
                );
                Ok(RecordOutcome::Failed {
                    message: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}
