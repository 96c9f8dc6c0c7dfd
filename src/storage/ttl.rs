//! Key-value store with per-entry expiry.
//!
//! Owned by whoever needs it (rate limiter, usage ledger) and injected
//! rather than held in a global. Expired entries are dropped lazily on
//! access and in bulk by [`TtlStore::purge_expired`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

/// Thread-safe string-keyed map with optional TTL per entry.
#[derive(Debug)]
pub struct TtlStore<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V> Default for TtlStore<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, unless missing or expired.
    pub fn get(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = entries.get(key)?.is_expired(now);
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    /// Store a value. `ttl = None` keeps it until removed.
    pub fn insert(&self, key: &str, value: V, ttl: Option<Duration>, now: Instant) {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|d| now + d),
            },
        );
    }

    /// Atomically read-modify-write a key.
    ///
    /// `f` receives the live value (or `None` if missing/expired) and
    /// returns the value to store. A fresh TTL is applied only when the
    /// key was absent; updates keep the existing expiry.
    pub fn upsert<F>(&self, key: &str, ttl: Option<Duration>, now: Instant, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut entries = self.entries.lock();
        let live = entries.get(key).filter(|e| !e.is_expired(now));
        let expires_at = match live {
            Some(entry) => entry.expires_at,
            None => ttl.map(|d| now + d),
        };
        let value = f(live.map(|e| &e.value));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at,
            },
        );
        value
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().remove(key).map(|e| e.value)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_respects_ttl() {
        let store = TtlStore::new();
        let t0 = Instant::now();
        store.insert("a", 1u32, Some(Duration::from_secs(10)), t0);

        assert_eq!(store.get("a", t0 + Duration::from_secs(9)), Some(1));
        assert_eq!(store.get("a", t0 + Duration::from_secs(10)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let store = TtlStore::new();
        let t0 = Instant::now();
        store.insert("k", "v".to_string(), None, t0);
        assert_eq!(
            store.get("k", t0 + Duration::from_secs(1_000_000)),
            Some("v".to_string())
        );
    }

    #[test]
    fn test_upsert_keeps_original_expiry() {
        let store = TtlStore::new();
        let t0 = Instant::now();
        let ttl = Some(Duration::from_secs(60));

        assert_eq!(store.upsert("n", ttl, t0, |v| v.copied().unwrap_or(0) + 1), 1);
        let t1 = t0 + Duration::from_secs(30);
        assert_eq!(store.upsert("n", ttl, t1, |v| v.copied().unwrap_or(0) + 1), 2);

        // Expires 60s after first write, not after the update.
        let t2 = t0 + Duration::from_secs(61);
        assert_eq!(store.get("n", t2), None);
        assert_eq!(store.upsert("n", ttl, t2, |v| v.copied().unwrap_or(0) + 1), 1);
    }

    #[test]
    fn test_purge_expired() {
        let store = TtlStore::new();
        let t0 = Instant::now();
        store.insert("short", 1, Some(Duration::from_secs(1)), t0);
        store.insert("long", 2, Some(Duration::from_secs(100)), t0);
        store.insert("forever", 3, None, t0);

        assert_eq!(store.purge_expired(t0 + Duration::from_secs(5)), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.remove("forever"), Some(3));
    }

    #[test]
    fn test_isolated_instances() {
        let a = TtlStore::new();
        let b: TtlStore<i32> = TtlStore::new();
        let t0 = Instant::now();
        a.insert("k", 1, None, t0);
        assert_eq!(b.get("k", t0), None);
    }
}
