// # ddns-core
//
// Core library for the Aliyun dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for detecting the current public IP
// - **DnsProvider**: Trait for listing and updating DNS records via provider APIs
// - **StateStore**: Trait for persisting the last IP pushed to DNS
// - **ResolutionUpdater**: Lists records, matches the host label, updates each match
// - **DdnsEngine**: Orchestrates one IP check → DNS update run
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single-shot**: One run, one attempt, strictly sequential
// 3. **Explicit configuration**: Settings are passed in, never read from globals
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, StateStore, DomainRecord};
pub use engine::{DdnsEngine, ResolutionUpdater, RunOutcome, UpdateReport};
pub use config::{DdnsConfig, DomainParts, IpVersion, Settings};
pub use error::{Error, Result};
pub use state::{MemoryStateStore, FileStateStore};
