use std::time::Instant;

use crate::key::CacheKey;

/// Keeps cache keys sorted by expiry so both GC (sweep from the head while
/// expired) and capacity eviction (drop the oldest deadline first) are
/// cheap. Insertion is `O(log n)` to find the slot plus `O(n)` to shift —
/// the same shape as the `deadlineFolder` this is modeled on, minus a
/// redundant insert it performed on every call.
#[derive(Debug, Default)]
pub struct DeadlineIndex {
    entries: Vec<(Instant, CacheKey)>,
}

impl DeadlineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts in ascending-expiry order; ties keep insertion order by
    /// landing after any existing entry with an equal deadline.
    pub fn insert(&mut self, expiry: Instant, key: CacheKey) {
        let idx = self.entries.partition_point(|(e, _)| *e <= expiry);
        self.entries.insert(idx, (expiry, key));
    }

    pub fn remove(&mut self, key: CacheKey) {
        self.entries.retain(|(_, k)| *k != key);
    }

    /// Removes and returns every entry whose deadline has passed.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<CacheKey> {
        let split = self.entries.partition_point(|(e, _)| *e <= now);
        self.entries.drain(..split).map(|(_, k)| k).collect()
    }

    /// Pops the single oldest deadline, for capacity-driven eviction.
    pub fn pop_oldest(&mut self) -> Option<CacheKey> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0).1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(n: u8) -> CacheKey {
        crate::key::CacheKey::new(&format!("host-{n}.test"), sinkdns_proto::QueryType::A)
    }

    #[test]
    fn keeps_ascending_order() {
        let base = Instant::now();
        let mut idx = DeadlineIndex::new();
        idx.insert(base + Duration::from_secs(30), key(1));
        idx.insert(base + Duration::from_secs(10), key(2));
        idx.insert(base + Duration::from_secs(20), key(3));

        assert_eq!(idx.pop_oldest(), Some(key(2)));
        assert_eq!(idx.pop_oldest(), Some(key(3)));
        assert_eq!(idx.pop_oldest(), Some(key(1)));
    }

    #[test]
    fn drains_only_expired() {
        let base = Instant::now();
        let mut idx = DeadlineIndex::new();
        idx.insert(base, key(1));
        idx.insert(base + Duration::from_secs(1000), key(2));

        let expired = idx.drain_expired(base + Duration::from_millis(1));
        assert_eq!(expired, vec![key(1)]);
        assert_eq!(idx.len(), 1);
    }
}
