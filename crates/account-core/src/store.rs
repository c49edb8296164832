//! Persistence backends for the account record
//!
//! Stores deal in opaque bytes keyed by name; [`AccountManager`] serializes
//! the account's persisted fields before handing them over. Neither backend
//! here is a secure credential store. Platform keychains plug in by
//! implementing [`AccountStore`].
//!
//! [`AccountManager`]: crate::manager::AccountManager

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::{AccountError, Result};

/// Keyed byte storage for persisted accounts
///
/// A missing key is not an error: reads return `Ok(None)` and deletes succeed.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous value
    async fn set_data(&self, key: &str, data: &[u8]) -> Result<()>;

    async fn data_for_key(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn delete_data_for_key(&self, key: &str) -> Result<()>;
}

/// Process-local store, mainly for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn set_data(&self, key: &str, data: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn data_for_key(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn delete_data_for_key(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
///
/// Files are plain JSON readable by anyone with access to the directory.
#[derive(Debug, Clone)]
pub struct FileAccountStore {
    directory: PathBuf,
}

impl FileAccountStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File for `key`: ASCII letters, digits and `-` are kept, every other
    /// byte becomes `_xx` (lowercase hex), so distinct keys never share a file
    fn path_for_key(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(AccountError::Storage("empty storage key".to_string()));
        }

        let mut file_stem = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_stem.push(char::from(byte));
            } else {
                file_stem.push_str(&format!("_{:02x}", byte));
            }
        }

        Ok(self.directory.join(format!("{}.json", file_stem)))
    }
}

#[async_trait]
impl AccountStore for FileAccountStore {
    async fn set_data(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for_key(key)?;
        tokio::fs::create_dir_all(&self.directory).await?;

        // Write next to the target and rename so readers never see a partial file
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, data).await?;
        tokio::fs::rename(&staging, &path).await?;

        debug!("Stored {} bytes for key {} at {}", data.len(), key, path.display());
        Ok(())
    }

    async fn data_for_key(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for_key(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("No stored data for key {}", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_data_for_key(&self, key: &str) -> Result<()> {
        let path = self.path_for_key(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
