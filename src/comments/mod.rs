//! Comments on posts.

use std::sync::Arc;

use crate::errors::ClientError;
use crate::models::{Comment, NewComment, PostId};
use crate::remote::CommentStore;
use crate::session::SessionContext;

pub struct Comments {
    session: Arc<SessionContext>,
    store: Arc<dyn CommentStore>,
}

impl Comments {
    pub fn new(session: Arc<SessionContext>, store: Arc<dyn CommentStore>) -> Self {
        Self { session, store }
    }

    pub async fn list(&self, post_id: &PostId) -> Result<Vec<Comment>, ClientError> {
        self.store.list_comments(post_id).await
    }

    /// Add a comment as the signed-in user.
    pub async fn add(&self, post_id: &PostId, content: &str) -> Result<Comment, ClientError> {
        let identity = self.session.identity().ok_or(ClientError::NoSession)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Validation(
                "Comment cannot be empty.".to_string(),
            ));
        }

        let comment = NewComment {
            post_id: post_id.clone(),
            content: content.to_string(),
            author_id: identity.id,
            author_name: identity.name,
        };

        let stored = self.store.add_comment(&comment).await?;
        tracing::debug!("Added comment {} on post {}", stored.id, post_id);
        Ok(stored)
    }
}
