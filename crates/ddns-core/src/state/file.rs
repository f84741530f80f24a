// # File State Store
//
// File-based implementation of StateStore.
//
// ## Purpose
//
// Persists the last IP pushed to DNS across runs, so that a scheduled run
// with an unchanged address makes no provider calls.
//
// ## File Format
//
// A single plain-text address, e.g.:
//
// ```text
// 203.0.113.7
// ```
//
// Surrounding whitespace is ignored on read, so files edited by hand (with a
// trailing newline) load fine.
//
// ## Crash Safety
//
// - Atomic writes: new content is written to a temporary file, then renamed
// - A missing or empty file reads as "nothing persisted yet"

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::state_store::StateStore;

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::FileStateStore;
/// use ddns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/ddns/ip.txt").await?;
///
///     store.set_last_ip("203.0.113.7").await?;
///     assert_eq!(store.get_last_ip().await?.as_deref(), Some("203.0.113.7"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a file state store
    ///
    /// Creates parent directories if needed. The file itself is only
    /// written on the first [`StateStore::set_last_ip`].
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_last_ip(&self) -> Result<Option<String>, Error> {
        if !self.path.exists() {
            tracing::debug!("State file does not exist: {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let ip = content.trim();
        if ip.is_empty() {
            tracing::debug!("State file is empty: {}", self.path.display());
            return Ok(None);
        }

        tracing::info!("Last persisted IP: {}", ip);
        Ok(Some(ip.to_string()))
    }

    async fn set_last_ip(&self, ip: &str) -> Result<(), Error> {
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Persisted IP {} to {}", ip, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");

        let store = FileStateStore::new(&path).await.unwrap();

        // Nothing persisted yet
        assert_eq!(store.get_last_ip().await.unwrap(), None);
        assert!(!path.exists());

        store.set_last_ip("203.0.113.7").await.unwrap();
        assert_eq!(
            store.get_last_ip().await.unwrap().as_deref(),
            Some("203.0.113.7")
        );

        // Plain text on disk, no temp file left behind
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "203.0.113.7");
        assert!(!store.temp_path().exists());

        // A new instance sees the same value
        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(
            store2.get_last_ip().await.unwrap().as_deref(),
            Some("203.0.113.7")
        );
    }

    #[tokio::test]
    async fn test_file_store_trims_hand_written_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");
        fs::write(&path, b"198.51.100.1\n").await.unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert_eq!(
            store.get_last_ip().await.unwrap().as_deref(),
            Some("198.51.100.1")
        );
    }

    #[tokio::test]
    async fn test_file_store_empty_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");
        fs::write(&path, b"  \n").await.unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store.get_last_ip().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("ip.txt");

        let store = FileStateStore::new(&path).await.unwrap();
        store.set_last_ip("2001:db8::1").await.unwrap();

        assert!(path.exists());
        assert_eq!(
            store.get_last_ip().await.unwrap().as_deref(),
            Some("2001:db8::1")
        );
    }

    #[tokio::test]
    async fn test_file_store_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip.txt");

        let store = FileStateStore::new(&path).await.unwrap();
        for i in 0..10 {
            store.set_last_ip(&format!("192.0.2.{}", i)).await.unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "192.0.2.9");
    }
}
