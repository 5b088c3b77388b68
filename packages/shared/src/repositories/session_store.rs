use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::repositories::errors::session_store_errors::SessionStoreError;

/// Pluggable key-value store for session records. The server runs
/// entirely from in-memory state; this store is best-effort bookkeeping
/// that an external backend (Redis etc.) can implement behind the same
/// contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), SessionStoreError>;
    async fn remove(&self, key: &str) -> Result<(), SessionStoreError>;
}

/// Default in-process implementation. Expired entries are reaped lazily
/// on read.
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        InMemorySessionStore {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(stored) => {
                if let Some(expires_at) = stored.expires_at {
                    if Instant::now() >= expires_at {
                        entries.remove(key);
                        return Ok(None);
                    }
                }
                Ok(Some(stored.value.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }
}
