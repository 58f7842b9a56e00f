use std::collections::HashMap;
use ahash::RandomState;

/// Exact request counts per identity key.
pub(crate) struct CountMap {
    counts: HashMap<String, u64, RandomState>,
}

impl CountMap {
    pub(crate) fn with_hasher(hasher: RandomState) -> Self {
        Self {
            counts: HashMap::with_hasher(hasher),
        }
    }

    /// Bumps the count for `key` by one and returns the new count.
    /// Absent keys start at zero.
    pub(crate) fn increment(&mut self, key: &str) -> u64 {
        // Avoid allocating the key on the hot path for keys we already know
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
            return *count;
        }
        self.counts.insert(key.to_owned(), 1);
        1
    }

    pub(crate) fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    pub(crate) fn clear(&mut self) {
        self.counts.clear();
    }
}
