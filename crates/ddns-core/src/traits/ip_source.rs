// # IP Source Trait
//
// Defines the interface for detecting the caller's current public IP.
//
// ## Implementations
//
// - HTTP-based: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Current IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::config::IpVersion;

/// Trait for IP source implementations
///
/// The engine treats the source as a black box that answers one question:
/// what is the public address right now.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O needed to discover the address (HTTP, sockets)
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Access the state store (owned by `DdnsEngine`)
/// - ❌ Retry or poll (a run makes exactly one lookup)
/// - ❌ Decide whether an update is needed
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the IP version this source reports
    ///
    /// Returns `IpVersion::Both` if the implementation does not filter.
    fn version(&self) -> IpVersion {
        IpVersion::Both
    }
}
