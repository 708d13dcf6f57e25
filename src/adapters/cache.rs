//! TTL cache for adapter responses. Plain map plus expiry timestamps; the
//! cache-cleanup worker calls `purge_expired` periodically so entries for
//! keys that are never re-read still get dropped.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let (expires_at, value) = entries.get(key)?;
        if *expires_at <= Instant::now() {
            return None;
        }
        Some(value.clone())
    }

    pub fn put(&self, key: String, value: V, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, (Instant::now() + ttl, value));
        }
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, (expires_at, _)| *expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entries_hit() {
        let cache = TtlCache::new();
        cache.put("k".to_string(), 42, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn expired_entries_miss_and_purge() {
        let cache = TtlCache::new();
        cache.put("k".to_string(), 42, Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_keeps_live_entries() {
        let cache = TtlCache::new();
        cache.put("live".to_string(), 1, Duration::from_secs(60));
        cache.put("dead".to_string(), 2, Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("live"), Some(1));
    }
}
