//! Core traits for the DDNS updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Detect the current public IP
//! - [`DnsProvider`]: List and update DNS records via provider APIs
//! - [`StateStore`]: Persist the last IP pushed to DNS

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DomainRecord};
pub use state_store::StateStore;
