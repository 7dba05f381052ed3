//! Collaborator seams for the hosted backend.
//!
//! The data store owns posts, profiles and comments; the auth service owns
//! credentials. Both are reached over HTTP in production ([`RestBackend`]) and
//! replaced by in-memory fakes in tests.

mod rest;

pub use rest::RestBackend;

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::{AuthSession, Comment, Identity, NewComment, Post, PostId, VoteCounts};

/// Post reads and counter writes.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Posts whose title contains `search` (case-insensitive), newest first.
    /// An empty search returns every post.
    async fn list_posts(&self, search: &str) -> Result<Vec<Post>, ClientError>;

    /// Overwrite both counters of one post in a single call.
    async fn update_vote_counts(&self, id: &PostId, counts: VoteCounts) -> Result<(), ClientError>;
}

/// The `users` profile table.
///
/// Lookups return `Ok(None)` for "no such row"; `Err` is reserved for real
/// read failures.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_roll(&self, roll: &str) -> Result<Option<Identity>, ClientError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, ClientError>;

    /// Insert a profile and return the stored row, server defaults included.
    async fn insert(&self, profile: &Identity) -> Result<Identity, ClientError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments on a post, oldest first.
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ClientError>;
    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ClientError>;
}

/// Hosted email/password authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an auth user. Returns the new user id when the service hands
    /// one out immediately.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<String>, ClientError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ClientError>;
}
