use std::{
    hash::Hash,
    time::{Duration, Instant},
};

/// A concurrent map whose entries expire after a fixed time-to-live.
///
/// Expired entries are evicted lazily, from the insertion path only: there
/// is no background sweeper task. An insertion-ordered queue of creation
/// timestamps makes the eviction scan cheap, since the oldest entries are
/// always at the front.
pub(crate) struct ExpiringCache<K, V> {
    /// Fast concurrent lookups of live entries.
    index: scc::HashMap<K, V>,
    /// Creation order of entries, scanned from the front on insertion.
    order: scc::Queue<Lifetime<K>>,
    /// Time-to-live of an entry, counted from its first insertion.
    ttl: Duration,
}

/// Tracks when a key entered the cache.
struct Lifetime<K> {
    key: K,
    born: Instant,
}

impl<K: Hash + Eq + Copy + 'static, V: Clone> ExpiringCache<K, V> {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            index: scc::HashMap::default(),
            order: scc::Queue::default(),
            ttl,
        }
    }

    /// Inserts or updates an entry, evicting any expired ones first.
    ///
    /// Updating an existing key does not renew its lifetime; the entry keeps
    /// the timestamp of its first insertion. Returns `true` if the key was
    /// newly inserted.
    pub(crate) fn insert(&self, key: K, value: V) -> bool {
        self.evict_expired();
        let is_new = self.index.upsert(key, value).is_none();
        if is_new {
            self.order.push(Lifetime { key, born: Instant::now() });
        }
        is_new
    }

    /// Returns a clone of the value stored under `key`, if any.
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.index.read(key, |_, v| v.clone())
    }

    fn evict_expired(&self) {
        while let Ok(Some(stale)) =
            self.order.pop_if(|l| l.born.elapsed() >= self.ttl)
        {
            self.index.remove(&stale.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_does_not_renew_lifetime() {
        let cache = ExpiringCache::new(Duration::from_secs(60));
        assert!(cache.insert(1u8, "a"));
        assert!(!cache.insert(1u8, "b"));
        assert_eq!(cache.get(&1), Some("b"));
    }

    #[test]
    fn expired_entries_are_evicted_on_insert() {
        let cache = ExpiringCache::new(Duration::ZERO);
        cache.insert(1u8, "a");
        cache.insert(2u8, "b");
        assert!(cache.get(&1).is_none());
    }
}
