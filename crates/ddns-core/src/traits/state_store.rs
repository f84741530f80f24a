// # State Store Trait
//
// Defines the interface for persisting the last IP pushed to DNS.
//
// ## Purpose
//
// The state store makes repeated runs cheap: when the current IP equals the
// persisted one, the run ends without touching the provider.
//
// ## Implementations
//
// - File-based: plain-text file holding a single address
// - In-memory: for tests and embedding
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::StateStore;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let store = /* StateStore implementation */;
//
//     let last_ip = store.get_last_ip().await?;
//     store.set_last_ip("203.0.113.7").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for state store implementations
///
/// The stored value is an opaque string. Comparison against the current IP
/// is done by the engine.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (owned by `DnsProvider`)
/// - ❌ Decide when to update (owned by `DdnsEngine`)
///
/// No locking across processes is provided. Two concurrent runs may race on
/// the same store.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the last persisted IP
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The last persisted IP
    /// - `Ok(None)`: Nothing persisted yet (first run)
    /// - `Err(Error)`: Storage error
    async fn get_last_ip(&self) -> Result<Option<String>, crate::Error>;

    /// Persist the IP that DNS now points to
    async fn set_last_ip(&self, ip: &str) -> Result<(), crate::Error>;
}
