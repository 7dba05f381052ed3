//! Comment model matching the hosted `comments` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{nullable_string, PostId, RowId};

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RowId,
    pub post_id: PostId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row written when adding a comment.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
}

/// Request body for adding a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}
