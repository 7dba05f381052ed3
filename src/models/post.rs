//! Post model matching the hosted `posts` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{nullable_count, nullable_string};

/// Row identifier as assigned by the store: either a serial integer or text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

pub type PostId = RowId;

impl RowId {
    /// Parse a path segment, preferring the integer form.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(RowId::Int)
            .unwrap_or_else(|_| RowId::Text(raw.to_string()))
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::Int(id) => write!(f, "{}", id),
            RowId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        RowId::Int(id)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        RowId::Text(id.to_string())
    }
}

/// A forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default)]
    pub flair: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "nullable_count")]
    pub upvotes: i64,
    #[serde(default, deserialize_with = "nullable_count")]
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Net score shown next to the vote buttons.
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    /// Counters after applying a delta.
    pub fn counts_after(&self, delta_up: i64, delta_down: i64) -> VoteCounts {
        VoteCounts {
            upvotes: self.upvotes + delta_up,
            downvotes: self.downvotes + delta_down,
        }
    }
}

/// Absolute counter values written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub upvotes: i64,
    pub downvotes: i64,
}
