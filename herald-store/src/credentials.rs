use crate::{KvStore, StoreError};
use herald_common::Network;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A pair of opaque bearer tokens for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

/// Credential view over a [`KvStore`].
#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KvStore>,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    pub async fn access_token(&self, network: Network) -> Result<Option<String>, StoreError> {
        self.non_empty(&network.access_token_key()).await
    }

    pub async fn refresh_token(&self, network: Network) -> Result<Option<String>, StoreError> {
        self.non_empty(&network.refresh_token_key()).await
    }

    /// Overwrite both tokens for `network`.
    pub async fn save(&self, network: Network, creds: &Credentials) -> Result<(), StoreError> {
        self.kv
            .put(&network.access_token_key(), &creds.access_token)
            .await?;
        self.kv
            .put(&network.refresh_token_key(), &creds.refresh_token)
            .await?;
        tracing::info!(%network, "credentials.saved");
        Ok(())
    }

    async fn non_empty(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.kv.get(key).await?.filter(|v| !v.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn save_writes_both_keys() {
        let kv = MemoryStore::new();
        let store = CredentialStore::new(Arc::new(kv.clone()));
        store
            .save(
                Network::X,
                &Credentials {
                    access_token: "a".into(),
                    refresh_token: "r".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(kv.get("x_access_token").await.unwrap().as_deref(), Some("a"));
        assert_eq!(kv.get("x_refresh_token").await.unwrap().as_deref(), Some("r"));
        assert_eq!(store.access_token(Network::X).await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn blank_tokens_count_as_missing() {
        let kv = MemoryStore::new();
        kv.put("x_access_token", "  ").await.unwrap();
        let store = CredentialStore::new(Arc::new(kv));
        assert_eq!(store.access_token(Network::X).await.unwrap(), None);
        assert_eq!(store.refresh_token(Network::X).await.unwrap(), None);
    }
}
