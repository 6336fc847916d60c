//! Key-value credential store.
//!
//! Everything that persists between requests goes through the [`KvStore`]
//! capability: OAuth tokens per network and the short-lived PKCE stash used
//! by the X authorization flow. Two backends exist:
//!
//! - [`MemoryStore`]: process-local, for tests and throwaway runs
//! - [`SqliteStore`]: a single `kv_store` table, last writer wins
//!
//! [`credentials`] layers the `<network>_access_token` /
//! `<network>_refresh_token` naming on top.
use async_trait::async_trait;
use std::sync::Arc;

pub mod credentials;
pub mod memory;
pub mod sqlite;

pub use credentials::{CredentialStore, Credentials};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// URL that selects the in-memory backend in [`open_store`].
pub const MEMORY_URL: &str = "memory";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid store url: {0}")]
    Url(String),
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value; `None` when the key was never written or was deleted.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Remove a key and return what it held. Of several concurrent callers
    /// for the same key, at most one sees the value.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Open the backend named by `url`: [`MEMORY_URL`] or a `sqlite:` URL.
pub async fn open_store(url: &str) -> Result<Arc<dyn KvStore>, StoreError> {
    if url.trim() == MEMORY_URL {
        tracing::warn!("store.memory: credentials will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }
    if !url.starts_with("sqlite:") {
        return Err(StoreError::Url(url.to_string()));
    }
    let store = SqliteStore::connect(url).await?;
    Ok(Arc::new(store))
}
