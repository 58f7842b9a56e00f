//! Exact per-address request counting with a bounded top-k ranking
//!
//! Every recorded key keeps an exact count. Alongside the counts a bounded min-heap
//! keeps the `k` (100 by default) keys with the highest counts, so the ranked list
//! can be produced at any time without scanning every key ever seen.
//!
//! Ranking updates are lazy: refreshing a ranked key pushes a new heap entry and
//! leaves the old one behind as stale, to be skipped when it reaches the root.

mod error;
pub use error::TrackerError;

mod tracker;
pub use tracker::{RequestTracker, TopKTracker, DEFAULT_CAPACITY};

mod replay;
pub use replay::{replay, ReplayStats};

mod count_map;
mod priority_queue;
pub use priority_queue::RankEntry;
