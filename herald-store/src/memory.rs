use crate::{KvStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

/// Process-local store. Cloning shares the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: std::sync::Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.remove(key).map(|(_, v)| v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.put("x_access_token", "t1").await.unwrap();
        assert_eq!(b.get("x_access_token").await.unwrap().as_deref(), Some("t1"));

        b.put("x_access_token", "t2").await.unwrap();
        assert_eq!(a.get("x_access_token").await.unwrap().as_deref(), Some("t2"));

        a.delete("x_access_token").await.unwrap();
        assert_eq!(b.get("x_access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_takes_see_the_value_once() {
        let store = MemoryStore::new();
        store.put("x_oauth_state_abc", "verifier").await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take("x_oauth_state_abc").await.unwrap() })
            })
            .collect();
        let mut winners = 0;
        for t in tasks {
            if t.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
