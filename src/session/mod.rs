//! Session context and the flows that populate it.
//!
//! [`SessionContext`] is built once at startup and handed to every component
//! that needs to know who is signed in. It mirrors the `user` and
//! `sessionKey` cache entries; the flows in this module are the only writers.

mod auth;
mod bootstrap;
mod sso_status;

pub use auth::*;
pub use bootstrap::*;
pub use sso_status::*;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::cache::{keys, read_json, LocalCache};
use crate::models::Identity;

/// Parameters read from the page address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Fresh SSO session token
    #[serde(default)]
    pub accessid: Option<String>,
    /// Free-text title filter
    #[serde(default)]
    pub search: Option<String>,
}

impl PageParams {
    /// The SSO token, if one was passed and is not blank.
    pub fn fresh_token(&self) -> Option<&str> {
        self.accessid
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}

/// Who is signed in, as far as this client knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub token: Option<String>,
    /// User-facing notice queued by a bootstrapper
    pub notice: Option<String>,
}

/// Explicit holder of the current session.
pub struct SessionContext {
    cache: Arc<dyn LocalCache>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self {
            cache,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Build a context seeded from whatever the cache already holds.
    pub async fn restore(cache: Arc<dyn LocalCache>) -> Self {
        let identity: Option<Identity> = read_json(cache.as_ref(), keys::USER).await;
        let token: Option<String> = read_json(cache.as_ref(), keys::SESSION_KEY).await;

        let context = Self::new(cache);
        context.adopt(identity, token);
        context
    }

    pub fn cache(&self) -> &dyn LocalCache {
        self.cache.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// Partition key for per-session vote state.
    pub fn partition(&self) -> String {
        self.read()
            .token
            .clone()
            .unwrap_or_else(|| keys::ANON_PARTITION.to_string())
    }

    pub fn notice(&self) -> Option<String> {
        self.read().notice.clone()
    }

    pub(crate) fn adopt(&self, identity: Option<Identity>, token: Option<String>) {
        let mut state = self.write();
        state.identity = identity;
        state.token = token;
    }

    pub(crate) fn set_notice(&self, notice: Option<String>) {
        self.write().notice = notice;
    }

    pub(crate) fn forget_token(&self) {
        self.write().token = None;
    }

    pub(crate) fn clear(&self) {
        *self.write() = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{write_json, MemoryCache};
    use crate::testing::identity;

    #[test]
    fn test_fresh_token_ignores_blank() {
        let params = PageParams {
            accessid: Some("  ".to_string()),
            search: None,
        };
        assert!(params.fresh_token().is_none());
        assert_eq!(params.search(), "");

        let params = PageParams {
            accessid: Some("tok".to_string()),
            search: Some("Mess".to_string()),
        };
        assert_eq!(params.fresh_token(), Some("tok"));
        assert_eq!(params.search(), "Mess");
    }

    #[tokio::test]
    async fn test_restore_reads_cache() {
        let cache = Arc::new(MemoryCache::new());
        write_json(cache.as_ref(), keys::USER, &identity("u-1", "21B0001")).await;
        write_json(cache.as_ref(), keys::SESSION_KEY, "tok-1").await;

        let session = SessionContext::restore(cache).await;
        assert_eq!(session.identity().unwrap().id, "u-1");
        assert_eq!(session.partition(), "tok-1");
    }

    #[tokio::test]
    async fn test_partition_falls_back_to_anon() {
        let session = SessionContext::restore(Arc::new(MemoryCache::new())).await;
        assert!(session.identity().is_none());
        assert_eq!(session.partition(), keys::ANON_PARTITION);
    }
}
