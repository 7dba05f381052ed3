//! Vote reconciliation.
//!
//! A vote is a two-step affair: the new absolute counters are written to the
//! store first, and only once that write is acknowledged are the cached post
//! and the session's vote map updated. A per-post in-flight flag keeps a
//! second click from computing its delta off the same base while the first
//! write is still outstanding.
//!
//! Two tabs or devices voting on the same post can still race each other;
//! the store's last write wins.

mod banner;

pub use banner::TransientBanner;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use crate::cache::{keys, write_json, LocalCache};
use crate::errors::ErrorState;
use crate::feed::PostFeed;
use crate::models::{Post, PostId, VoteDirection, VoteState, VoteTransition};
use crate::remote::PostStore;
use crate::session::SessionContext;

pub const VOTE_FAILED_MESSAGE: &str = "Failed to update vote. Please try again.";

/// What happened to a vote request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VoteOutcome {
    /// Store acknowledged the write; local state updated
    Applied {
        post: Post,
        vote: Option<VoteDirection>,
    },
    /// Another vote on this post is still in flight
    Busy,
    /// The post is not in the loaded feed
    PostMissing,
    /// Store rejected the write; nothing changed locally
    Failed { error: ErrorState },
}

/// Vote map of one session partition.
struct PartitionVotes {
    partition: String,
    state: VoteState,
}

impl PartitionVotes {
    async fn load(cache: &dyn LocalCache, partition: String) -> Self {
        let raw = match cache.get(&keys::votes(&partition)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not read vote state for {}: {}", partition, e);
                None
            }
        };

        Self {
            state: VoteState::from_cached(raw.as_deref()),
            partition,
        }
    }

    async fn persist(&self, cache: &dyn LocalCache) {
        write_json(cache, &keys::votes(&self.partition), &self.state).await;
    }
}

/// Clears a post's in-flight flag when dropped, including when the vote
/// future is abandoned half way.
struct InFlight<'a> {
    posts: &'a Mutex<HashSet<PostId>>,
    id: PostId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.posts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
    }
}

pub struct VoteReconciler {
    session: Arc<SessionContext>,
    store: Arc<dyn PostStore>,
    feed: Arc<PostFeed>,
    // Held across the cache write so snapshots are persisted in order.
    votes: tokio::sync::Mutex<PartitionVotes>,
    in_flight: Mutex<HashSet<PostId>>,
    banner: TransientBanner,
}

impl VoteReconciler {
    /// Create a reconciler with an empty vote map; call
    /// [`VoteReconciler::reload_votes`] once the session is resolved.
    pub fn new(
        session: Arc<SessionContext>,
        store: Arc<dyn PostStore>,
        feed: Arc<PostFeed>,
        error_ttl: Duration,
    ) -> Self {
        let partition = session.partition();
        Self {
            session,
            store,
            feed,
            votes: tokio::sync::Mutex::new(PartitionVotes {
                partition,
                state: VoteState::new(),
            }),
            in_flight: Mutex::new(HashSet::new()),
            banner: TransientBanner::new(error_ttl),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<PostId>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check-and-set the in-flight flag in one step.
    fn try_begin(&self, id: &PostId) -> Option<InFlight<'_>> {
        if !self.in_flight().insert(id.clone()) {
            return None;
        }
        Some(InFlight {
            posts: &self.in_flight,
            id: id.clone(),
        })
    }

    /// Re-read the vote map for the active session partition.
    pub async fn reload_votes(&self) {
        let partition = self.session.partition();
        let loaded = PartitionVotes::load(self.session.cache(), partition).await;
        tracing::debug!(
            "Loaded {} votes for partition {}",
            loaded.state.len(),
            loaded.partition
        );
        *self.votes.lock().await = loaded;
    }

    /// Lock the vote map, swapping in the active partition's map if the
    /// session changed since it was loaded.
    async fn current_votes(&self) -> tokio::sync::MutexGuard<'_, PartitionVotes> {
        let mut votes = self.votes.lock().await;
        let partition = self.session.partition();
        if votes.partition != partition {
            *votes = PartitionVotes::load(self.session.cache(), partition).await;
        }
        votes
    }

    pub async fn votes(&self) -> VoteState {
        self.current_votes().await.state.clone()
    }

    pub async fn vote_for(&self, id: &PostId) -> Option<VoteDirection> {
        self.current_votes().await.state.get(id)
    }

    /// Message of the transient vote-failure banner, if it is showing.
    pub fn vote_error(&self) -> Option<String> {
        self.banner.message()
    }

    pub fn is_in_flight(&self, id: &PostId) -> bool {
        self.in_flight().contains(id)
    }

    /// Toggle a vote on a post. Both buttons go through here.
    pub async fn cast_vote(&self, post_id: &PostId, direction: VoteDirection) -> VoteOutcome {
        let Some(_flag) = self.try_begin(post_id) else {
            tracing::debug!("Vote on {} ignored: previous vote still in flight", post_id);
            return VoteOutcome::Busy;
        };
        self.banner.clear();

        let (partition, current) = {
            let votes = self.current_votes().await;
            (votes.partition.clone(), votes.state.get(post_id))
        };
        let transition = VoteTransition::compute(current, direction);

        let Some(post) = self.feed.get(post_id) else {
            tracing::debug!("Vote on {} ignored: post not loaded", post_id);
            return VoteOutcome::PostMissing;
        };

        let counts = post.counts_after(transition.delta_up, transition.delta_down);
        if let Err(e) = self.store.update_vote_counts(post_id, counts).await {
            tracing::warn!("Vote on {} failed: {}", post_id, e);
            self.banner.show(VOTE_FAILED_MESSAGE);
            return VoteOutcome::Failed {
                error: ErrorState {
                    code: e.error_code().to_string(),
                    message: VOTE_FAILED_MESSAGE.to_string(),
                    detail: Some(e.message()),
                },
            };
        }

        let post = self
            .feed
            .apply_delta(post_id, transition.delta_up, transition.delta_down)
            .unwrap_or_else(|| Post {
                upvotes: counts.upvotes,
                downvotes: counts.downvotes,
                ..post
            });

        self.record_vote(partition, post_id, transition.next).await;

        VoteOutcome::Applied {
            post,
            vote: transition.next,
        }
    }

    /// Store the new vote under the partition it was cast in.
    async fn record_vote(&self, partition: String, post_id: &PostId, vote: Option<VoteDirection>) {
        let cache = self.session.cache();
        let mut votes = self.votes.lock().await;

        if votes.partition == partition {
            votes.state.set(post_id, vote);
            votes.persist(cache).await;
        } else {
            // The session changed while the write was in flight.
            let mut other = PartitionVotes::load(cache, partition).await;
            other.state.set(post_id, vote);
            other.persist(cache).await;
        }
    }
}
