//! Vote direction, toggle transitions and the per-session vote map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PostId;

/// Direction of a vote button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Outcome of pressing a vote button given the current vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTransition {
    /// Vote after the transition; `None` means the vote is removed
    pub next: Option<VoteDirection>,
    pub delta_up: i64,
    pub delta_down: i64,
}

impl VoteTransition {
    /// Toggle table: pressing the active direction removes the vote, pressing
    /// the other one switches it.
    pub fn compute(current: Option<VoteDirection>, action: VoteDirection) -> Self {
        use VoteDirection::{Down, Up};

        let (next, delta_up, delta_down) = match (current, action) {
            (None, Up) => (Some(Up), 1, 0),
            (None, Down) => (Some(Down), 0, 1),
            (Some(Up), Up) => (None, -1, 0),
            (Some(Up), Down) => (Some(Down), -1, 1),
            (Some(Down), Up) => (Some(Up), 1, -1),
            (Some(Down), Down) => (None, 0, -1),
        };

        Self {
            next,
            delta_up,
            delta_down,
        }
    }
}

/// Votes cast in one session, keyed by post id. A missing key means no vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteState(BTreeMap<String, VoteDirection>);

impl VoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a cached blob. Anything unreadable yields an empty map, and
    /// entries with unknown values are skipped.
    pub fn from_cached(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(entries)) => Self(
                entries
                    .into_iter()
                    .filter_map(|(key, value)| {
                        serde_json::from_value::<VoteDirection>(value)
                            .ok()
                            .map(|direction| (key, direction))
                    })
                    .collect(),
            ),
            Ok(_) => Self::default(),
            Err(e) => {
                tracing::warn!("Discarding malformed cached vote state: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, post_id: &PostId) -> Option<VoteDirection> {
        self.0.get(&post_id.to_string()).copied()
    }

    /// Record the vote for a post, deleting the key when `vote` is `None`.
    pub fn set(&mut self, post_id: &PostId, vote: Option<VoteDirection>) {
        let key = post_id.to_string();
        match vote {
            Some(direction) => {
                self.0.insert(key, direction);
            }
            None => {
                self.0.remove(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteDirection::{Down, Up};

    #[test]
    fn test_toggle_table() {
        let cases = [
            (None, Up, Some(Up), 1, 0),
            (None, Down, Some(Down), 0, 1),
            (Some(Up), Up, None, -1, 0),
            (Some(Up), Down, Some(Down), -1, 1),
            (Some(Down), Up, Some(Up), 1, -1),
            (Some(Down), Down, None, 0, -1),
        ];

        for (current, action, next, du, dd) in cases {
            let t = VoteTransition::compute(current, action);
            assert_eq!(t.next, next, "{:?} + {:?}", current, action);
            assert_eq!((t.delta_up, t.delta_down), (du, dd), "{:?} + {:?}", current, action);
        }
    }

    #[test]
    fn test_absent_is_key_deletion() {
        let mut state = VoteState::new();
        let post = PostId::from(3);
        state.set(&post, Some(Up));
        assert_eq!(serde_json::to_string(&state).unwrap(), r#"{"3":"up"}"#);

        state.set(&post, None);
        assert_eq!(serde_json::to_string(&state).unwrap(), "{}");
        assert!(state.get(&post).is_none());
    }

    #[test]
    fn test_from_cached_tolerates_garbage() {
        assert!(VoteState::from_cached(None).is_empty());
        assert!(VoteState::from_cached(Some("not json")).is_empty());
        assert!(VoteState::from_cached(Some("[1,2]")).is_empty());

        let state = VoteState::from_cached(Some(r#"{"1":"up","2":"sideways","3":"down"}"#));
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(&PostId::from(1)), Some(Up));
        assert_eq!(state.get(&PostId::from(3)), Some(Down));
    }
}
