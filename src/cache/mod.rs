//! Local persistent cache.
//!
//! A string key-value store holding the cached identity, the session token
//! and one vote-state blob per session partition. Values are JSON. Reads
//! never fail the caller: a missing or malformed entry reads as absent.

#[cfg(test)]
mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ClientError;

/// Cache keys.
pub mod keys {
    pub const USER: &str = "user";
    pub const SESSION_KEY: &str = "sessionKey";
    pub const AUTH_SESSION: &str = "auth_session";
    pub const SSO_USER: &str = "sso_user";

    /// Partition used when there is no session token.
    pub const ANON_PARTITION: &str = "anon";

    /// Key holding the vote state of one session partition.
    pub fn votes(partition: &str) -> String {
        format!("votes:{}", partition)
    }
}

/// String key-value storage that survives restarts.
#[async_trait]
pub trait LocalCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    async fn remove(&self, key: &str) -> Result<(), ClientError>;
}

/// Read and decode a JSON entry, treating any failure as absent.
pub async fn read_json<T: DeserializeOwned>(cache: &dyn LocalCache, key: &str) -> Option<T> {
    let raw = match cache.get(key).await {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!("Cache read of {} failed: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed cache entry {}: {}", key, e);
            None
        }
    }
}

/// Encode and store a JSON entry. Failures are logged, not returned.
pub async fn write_json<T: Serialize + ?Sized>(cache: &dyn LocalCache, key: &str, value: &T) {
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!("Failed to encode cache entry {}: {}", key, e);
            return;
        }
    };

    if let Err(e) = cache.set(key, &encoded).await {
        tracing::error!("Cache write of {} failed: {}", key, e);
    }
}

/// Remove an entry. Failures are logged, not returned.
pub async fn remove_entry(cache: &dyn LocalCache, key: &str) {
    if let Err(e) = cache.remove(key).await {
        tracing::error!("Cache removal of {} failed: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    #[tokio::test]
    async fn test_read_json_tolerates_malformed_entries() {
        let cache = MemoryCache::new();
        cache.set(keys::USER, "{not json").await.unwrap();

        let identity: Option<Identity> = read_json(&cache, keys::USER).await;
        assert!(identity.is_none());

        let missing: Option<String> = read_json(&cache, keys::SESSION_KEY).await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_json() {
        let cache = MemoryCache::new();
        write_json(&cache, keys::SESSION_KEY, "token-1").await;

        assert_eq!(
            cache.get(keys::SESSION_KEY).await.unwrap().as_deref(),
            Some("\"token-1\"")
        );
        let token: Option<String> = read_json(&cache, keys::SESSION_KEY).await;
        assert_eq!(token.as_deref(), Some("token-1"));
    }

    #[test]
    fn test_votes_key() {
        assert_eq!(keys::votes(keys::ANON_PARTITION), "votes:anon");
        assert_eq!(keys::votes("abc"), "votes:abc");
    }
}
