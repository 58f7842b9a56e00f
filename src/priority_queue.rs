use std::collections::HashMap;
use ahash::RandomState;

/// A ranked key together with the count it had when it was last ranked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankEntry {
    pub key: String,
    pub count: u64,
}

struct HeapEntry {
    count: u64,
    sequence: u64,
    key: String,
}

impl HeapEntry {
    // Equal counts evict the older entry first
    fn precedes(&self, other: &HeapEntry) -> bool {
        (self.count, self.sequence) < (other.count, other.sequence)
    }
}

/// A bounded min-heap that keeps the top-k keys by count.
///
/// Refreshing a key that is already ranked pushes a new heap entry instead of
/// re-sifting the old one. The old entry stays in the heap as a stale entry and
/// is skipped whenever it surfaces at the root. `live` is the authority on
/// which entry is valid: an entry is valid only if its sequence number matches
/// the one recorded for its key.
pub(crate) struct TopKQueue {
    live: HashMap<String, (u64, u64), RandomState>,  // key -> (count, sequence) of the valid entry
    heap: Vec<HeapEntry>,  // valid and stale entries, min-ordered by (count, sequence)
    capacity: usize,
    sequence: u64,
}

impl TopKQueue {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: RandomState) -> Self {
        Self {
            live: HashMap::with_capacity_and_hasher(capacity, hasher),
            heap: Vec::with_capacity(capacity + 1),
            capacity,
            sequence: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Number of valid entries.
    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn get(&self, key: &str) -> Option<u64> {
        self.live.get(key).map(|(count, _)| *count)
    }

    /// Smallest valid count, or 0 when nothing is ranked.
    #[cfg(test)]
    pub(crate) fn min_count(&self) -> u64 {
        self.live.values().map(|(count, _)| *count).min().unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn is_full(&self) -> bool {
        self.live.len() >= self.capacity
    }

    /// Ranks `key` at `count`. Returns whether `key` is ranked afterwards.
    ///
    /// When the queue is full a key that is not yet ranked only gets in if
    /// `count` is strictly greater than the smallest valid count, which is
    /// then evicted.
    pub(crate) fn upsert(&mut self, key: &str, count: u64) -> bool {
        if let Some(current) = self.live.get_mut(key) {
            if current.0 == count {
                return true;
            }
            // The previous heap entry for this key turns stale here
            self.sequence += 1;
            *current = (count, self.sequence);
        } else if self.live.len() < self.capacity {
            self.sequence += 1;
            self.live.insert(key.to_owned(), (count, self.sequence));
        } else {
            self.discard_stale_root();
            match self.heap.first() {
                Some(min) if count > min.count => {}
                _ => return false,
            }
            if let Some(evicted) = self.pop_root() {
                self.live.remove(&evicted.key);
            }
            self.sequence += 1;
            self.live.insert(key.to_owned(), (count, self.sequence));
        }

        self.push(HeapEntry {
            count,
            sequence: self.sequence,
            key: key.to_owned(),
        });
        self.maybe_compact();
        true
    }

    /// Valid entries sorted by count descending, equal counts by key ascending.
    pub(crate) fn snapshot(&self) -> Vec<RankEntry> {
        let mut entries: Vec<RankEntry> = self
            .live
            .iter()
            .map(|(key, (count, _))| RankEntry {
                key: key.clone(),
                count: *count,
            })
            .collect();

        entries.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        entries
    }

    pub(crate) fn clear(&mut self) {
        self.live.clear();
        self.heap.clear();
        self.sequence = 0;
    }

    fn is_valid(live: &HashMap<String, (u64, u64), RandomState>, entry: &HeapEntry) -> bool {
        live.get(&entry.key)
            .is_some_and(|&(_, sequence)| sequence == entry.sequence)
    }

    fn discard_stale_root(&mut self) {
        while let Some(root) = self.heap.first() {
            if Self::is_valid(&self.live, root) {
                break;
            }
            self.pop_root();
        }
    }

    // Rebuild without stale entries once the heap outgrows twice the capacity
    fn maybe_compact(&mut self) {
        if self.heap.len() <= self.capacity.saturating_mul(2) {
            return;
        }
        let live = &self.live;
        self.heap.retain(|entry| Self::is_valid(live, entry));
        for pos in (0..self.heap.len() / 2).rev() {
            self.sift_down(pos);
        }
    }

    fn push(&mut self, entry: HeapEntry) {
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
    }

    fn pop_root(&mut self) -> Option<HeapEntry> {
        let last = self.heap.pop()?;
        if self.heap.is_empty() {
            return Some(last);
        }
        let root = std::mem::replace(&mut self.heap[0], last);
        self.sift_down(0);
        Some(root)
    }

    // Binary heap helper methods using Eytzinger layout (0-based indexing)
    fn parent(i: usize) -> usize { (i - 1) >> 1 }
    fn left(i: usize) -> usize { 2 * i + 1 }
    fn right(i: usize) -> usize { 2 * i + 2 }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = Self::parent(pos);
            if self.heap[pos].precedes(&self.heap[parent]) {
                self.heap.swap(parent, pos);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let mut smallest = pos;
            let left = Self::left(pos);
            let right = Self::right(pos);

            if left < self.heap.len() && self.heap[left].precedes(&self.heap[smallest]) {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right].precedes(&self.heap[smallest]) {
                smallest = right;
            }

            if smallest == pos {
                break;
            }

            self.heap.swap(pos, smallest);
            pos = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(queue: &TopKQueue) -> Vec<(String, u64)> {
        queue
            .snapshot()
            .into_iter()
            .map(|entry| (entry.key, entry.count))
            .collect()
    }

    fn pairs(expected: &[(&str, u64)]) -> Vec<(String, u64)> {
        expected.iter().map(|(k, c)| (k.to_string(), *c)).collect()
    }

    #[test]
    fn test_basic_insertion() {
        let mut queue = TopKQueue::with_capacity(2);
        assert!(queue.upsert("a", 1));
        assert!(queue.upsert("b", 2));

        assert_eq!(ranked(&queue), pairs(&[("b", 2), ("a", 1)]));
    }

    #[test]
    fn test_update_existing() {
        let mut queue = TopKQueue::with_capacity_and_hasher(2, RandomState::new());
        queue.upsert("a", 1);
        queue.upsert("b", 2);
        queue.upsert("a", 3);

        assert_eq!(ranked(&queue), pairs(&[("a", 3), ("b", 2)]));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_refresh_leaves_stale_entry_behind() {
        let mut queue = TopKQueue::with_capacity(4);
        queue.upsert("a", 1);
        queue.upsert("a", 2);
        queue.upsert("a", 3);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.heap.len(), 3);
        assert_eq!(ranked(&queue), pairs(&[("a", 3)]));
    }

    #[test]
    fn test_stale_root_is_not_the_minimum() {
        let mut queue = TopKQueue::with_capacity(2);
        queue.upsert("a", 1);
        queue.upsert("b", 2);
        // "a" at 1 is now stale and sits at the root
        queue.upsert("a", 5);

        // Must evict "b" (2), not the stale "a" (1)
        assert!(queue.upsert("c", 3));
        assert_eq!(ranked(&queue), pairs(&[("a", 5), ("c", 3)]));
    }

    #[test]
    fn test_full_queue_requires_strictly_greater_count() {
        let mut queue = TopKQueue::with_capacity(2);
        queue.upsert("a", 2);
        queue.upsert("b", 3);

        assert!(!queue.upsert("c", 2));
        assert_eq!(queue.get("c"), None);
        assert!(!queue.upsert("c", 1));

        assert!(queue.upsert("c", 4));
        assert_eq!(ranked(&queue), pairs(&[("c", 4), ("b", 3)]));
    }

    #[test]
    fn test_equal_counts_evict_oldest_entry() {
        let mut queue = TopKQueue::with_capacity(2);
        queue.upsert("a", 1);
        queue.upsert("b", 1);
        queue.upsert("c", 2);

        assert_eq!(ranked(&queue), pairs(&[("c", 2), ("b", 1)]));
    }

    #[test]
    fn test_capacity_overflow() {
        let mut queue = TopKQueue::with_capacity_and_hasher(2, RandomState::new());

        queue.upsert("a", 1);
        queue.upsert("b", 2);
        queue.upsert("c", 3);
        queue.upsert("d", 4);
        queue.upsert("e", 5);

        assert_eq!(queue.len(), 2, "Queue should maintain capacity");
        assert!(queue.is_full());
        assert_eq!(ranked(&queue), pairs(&[("e", 5), ("d", 4)]));
    }

    #[test]
    fn test_repeated_updates_are_compacted() {
        let mut queue = TopKQueue::with_capacity_and_hasher(2, RandomState::new());

        for i in 1..100 {
            queue.upsert("a", i);
        }
        queue.upsert("b", 50);

        assert_eq!(queue.len(), 2);
        assert!(queue.heap.len() <= 4, "stale entries should be compacted, heap has {}", queue.heap.len());
        assert_eq!(ranked(&queue), pairs(&[("a", 99), ("b", 50)]));
    }

    #[test]
    fn test_evicted_key_can_return() {
        let mut queue = TopKQueue::with_capacity(1);
        queue.upsert("a", 1);
        queue.upsert("b", 2);
        assert_eq!(queue.get("a"), None);

        queue.upsert("a", 3);
        assert_eq!(ranked(&queue), pairs(&[("a", 3)]));
    }

    #[test]
    fn test_min_count() {
        let mut queue = TopKQueue::with_capacity(3);
        assert_eq!(queue.min_count(), 0);

        queue.upsert("a", 4);
        queue.upsert("b", 2);
        queue.upsert("c", 7);
        queue.upsert("b", 9);

        assert_eq!(queue.min_count(), 4);
    }

    #[test]
    fn test_zero_capacity_ranks_nothing() {
        let mut queue = TopKQueue::with_capacity(0);
        assert!(!queue.upsert("a", 10));
        assert!(queue.snapshot().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = TopKQueue::with_capacity(3);
        queue.upsert("a", 1);
        queue.upsert("a", 2);
        queue.upsert("b", 1);
        queue.clear();

        assert_eq!(queue.len(), 0);
        assert_eq!(queue.heap.len(), 0);
        assert!(queue.snapshot().is_empty());

        queue.upsert("a", 1);
        assert_eq!(ranked(&queue), pairs(&[("a", 1)]));
    }

    #[test]
    fn test_heap_property() {
        let mut queue = TopKQueue::with_capacity(10);

        for i in (0..=20u64).rev() {
            queue.upsert(&format!("item{}", i), i);
        }
        for i in 15..=20u64 {
            queue.upsert(&format!("item{}", i), i + 10);
        }

        for i in 1..queue.heap.len() {
            let parent = TopKQueue::parent(i);
            assert!(!queue.heap[i].precedes(&queue.heap[parent]),
                "Heap property violated: child {} at index {} precedes parent {} at index {}",
                queue.heap[i].count, i, queue.heap[parent].count, parent);
        }

        let items = queue.snapshot();
        assert_eq!(items.len(), 10);
        for pair in items.windows(2) {
            assert!(pair[0].count >= pair[1].count,
                "Items not properly ordered by count: {} before {}",
                pair[0].count, pair[1].count);
        }
    }

    #[test]
    fn test_snapshot_has_no_duplicate_keys() {
        let mut queue = TopKQueue::with_capacity(5);
        for round in 1..=10u64 {
            for key in ["a", "b", "c"] {
                queue.upsert(key, round);
            }
        }

        let items = queue.snapshot();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|entry| entry.count == 10));
        assert_eq!(items.iter().map(|e| e.key.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
