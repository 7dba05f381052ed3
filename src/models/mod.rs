//! Data models for the forum client.
//!
//! Field names follow the hosted backend's column names so rows round-trip
//! without renaming.

mod comment;
mod identity;
mod post;
mod vote;

pub use comment::*;
pub use identity::*;
pub use post::*;
pub use vote::*;

use serde::{Deserialize, Deserializer};

/// Treat a JSON `null` column like a missing one.
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Same as [`nullable_string`] for counters.
pub(crate) fn nullable_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}
