use std::num::NonZeroUsize;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::count_map::CountMap;
use crate::error::TrackerError;
use crate::priority_queue::{RankEntry, TopKQueue};

/// Number of keys ranked by [`TopKTracker::new`].
pub const DEFAULT_CAPACITY: usize = 100;

/// The calls a request-handling layer makes into a tracker.
#[cfg_attr(test, mockall::automock)]
pub trait RequestTracker {
    /// Counts one request from `key` and returns its new total.
    fn record(&self, key: &str) -> Result<u64, TrackerError>;

    /// The ranked keys, highest count first.
    fn top(&self) -> Vec<RankEntry>;

    /// Forgets every count.
    fn reset(&self);
}

struct State {
    counts: CountMap,
    ranking: TopKQueue,
}

/// Exact request counts per key plus a ranking of the `capacity` busiest keys.
///
/// Both structures live behind one lock so `record`, `top` and `reset` each
/// see them in step. Share a tracker between threads with `Arc` or by
/// reference.
///
/// A key that is not ranked and whose count only ties the smallest ranked
/// count is not admitted; it has to exceed it.
///
/// # Example
///
/// ```
/// use iptracker::TopKTracker;
///
/// let tracker = TopKTracker::new();
/// tracker.record("10.0.0.1").unwrap();
/// tracker.record("10.0.0.1").unwrap();
/// tracker.record("10.0.0.2").unwrap();
///
/// let top = tracker.top();
/// assert_eq!(top[0].key, "10.0.0.1");
/// assert_eq!(top[0].count, 2);
/// assert_eq!(tracker.count("10.0.0.2"), 1);
/// ```
pub struct TopKTracker {
    state: RwLock<State>,
}

impl TopKTracker {
    /// Creates a tracker ranking [`DEFAULT_CAPACITY`] keys.
    pub fn new() -> Self {
        Self::build(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::build(capacity.get())
    }

    fn build(capacity: usize) -> Self {
        let hasher = RandomState::new();
        Self {
            state: RwLock::new(State {
                counts: CountMap::with_hasher(hasher.clone()),
                ranking: TopKQueue::with_capacity_and_hasher(capacity, hasher),
            }),
        }
    }

    /// Counts one request from `key` and re-ranks it. Returns the new count.
    ///
    /// An empty key is rejected with [`TrackerError::InvalidKey`] and nothing
    /// changes.
    pub fn record(&self, key: &str) -> Result<u64, TrackerError> {
        if key.is_empty() {
            warn!("rejected empty key");
            return Err(TrackerError::InvalidKey);
        }

        let mut state = self.state.write();
        let count = state.counts.increment(key);
        let ranked = state.ranking.upsert(key, count);
        debug!(key, count, ranked, "recorded request");
        Ok(count)
    }

    /// Ranked keys sorted by count descending. Keys with equal counts are
    /// ordered by key.
    pub fn top(&self) -> Vec<RankEntry> {
        let top = self.state.read().ranking.snapshot();
        debug!(entries = top.len(), "top keys retrieved");
        top
    }

    /// Clears counts and ranking together.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.counts.clear();
        state.ranking.clear();
        info!("tracker has been reset");
    }

    /// Exact number of requests seen from `key` since the last reset.
    pub fn count(&self, key: &str) -> u64 {
        self.state.read().counts.get(key)
    }

    /// Whether `key` currently holds a place in [`top`](Self::top).
    pub fn is_ranked(&self, key: &str) -> bool {
        self.state.read().ranking.get(key).is_some()
    }

    /// Number of distinct keys counted.
    pub fn len(&self) -> usize {
        self.state.read().counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.read().ranking.capacity()
    }
}

impl Default for TopKTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TopKTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("TopKTracker")
            .field("keys", &state.counts.len())
            .field("ranked", &state.ranking.len())
            .field("capacity", &state.ranking.capacity())
            .finish()
    }
}

impl RequestTracker for TopKTracker {
    fn record(&self, key: &str) -> Result<u64, TrackerError> {
        TopKTracker::record(self, key)
    }

    fn top(&self) -> Vec<RankEntry> {
        TopKTracker::top(self)
    }

    fn reset(&self) {
        TopKTracker::reset(self)
    }
}
