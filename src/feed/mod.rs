//! Read-through cache of the post list for the current page.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::ClientError;
use crate::models::{Post, PostId};
use crate::remote::PostStore;

/// Posts loaded for the current page.
pub struct PostFeed {
    store: Arc<dyn PostStore>,
    posts: RwLock<Vec<Post>>,
}

impl PostFeed {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self {
            store,
            posts: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Post>> {
        self.posts.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Post>> {
        self.posts.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the cached list with posts matching `search`, newest first.
    /// The search text is passed through untouched. On failure the list is
    /// emptied.
    pub async fn load(&self, search: &str) -> Result<Vec<Post>, ClientError> {
        match self.store.list_posts(search).await {
            Ok(posts) => {
                tracing::debug!("Loaded {} posts for search {:?}", posts.len(), search);
                *self.write() = posts.clone();
                Ok(posts)
            }
            Err(e) => {
                tracing::error!("Error fetching posts: {}", e);
                self.write().clear();
                Err(e)
            }
        }
    }

    pub fn posts(&self) -> Vec<Post> {
        self.read().clone()
    }

    pub fn get(&self, id: &PostId) -> Option<Post> {
        self.read().iter().find(|p| &p.id == id).cloned()
    }

    /// Apply a confirmed counter delta and return the updated post.
    pub fn apply_delta(&self, id: &PostId, delta_up: i64, delta_down: i64) -> Option<Post> {
        let mut posts = self.write();
        let post = posts.iter_mut().find(|p| &p.id == id)?;
        post.upvotes += delta_up;
        post.downvotes += delta_down;
        Some(post.clone())
    }
}
