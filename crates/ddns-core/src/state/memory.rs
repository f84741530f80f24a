// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Provides a state store that doesn't persist across runs. Useful for
// testing and for embedding the engine in a long-lived process.
//
// ## Crash Behavior
//
// - All state is lost on restart
// - The first run after a restart treats the IP as new (will update DNS)

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::MemoryStateStore;
/// use ddns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///
///     store.set_last_ip("203.0.113.7").await?;
///     assert_eq!(store.get_last_ip().await?.as_deref(), Some("203.0.113.7"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds an IP
    pub fn with_ip(ip: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip.into()))),
        }
    }

    /// Forget the stored IP
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_last_ip(&self) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn set_last_ip(&self, ip: &str) -> Result<(), Error> {
        *self.inner.write().await = Some(ip.to_string());
        Ok(())
    }
}
