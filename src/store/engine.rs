use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::store::MonotonicClock;
use crate::util::Timestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: String,
    pub timestamp: Timestamp,
}

/// Per-node key-value map with last-writer-wins by timestamp.
///
/// Every check-then-write runs under the map's write lock, so two `set`
/// calls on the same key never interleave.
#[derive(Debug, Default)]
pub struct TimestampedStore {
    inner: RwLock<HashMap<String, Entry>>,
    clock: MonotonicClock,
}

impl TimestampedStore {
    pub fn new() -> Self {
        TimestampedStore {
            inner: RwLock::new(HashMap::new()),
            clock: MonotonicClock::new(),
        }
    }

    /// Applies a write.
    ///
    /// Without a timestamp the write is a local commit: it always wins and is
    /// stamped with the store's clock. With a timestamp it is accepted only if
    /// strictly newer than what the key already holds; equal timestamps are
    /// treated as replays and rejected.
    pub fn set(&self, key: String, value: String, timestamp: Option<Timestamp>) -> bool {
        match timestamp {
            None => {
                self.commit(key, value);
                true
            }
            Some(ts) => {
                let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
                let current = map.get(&key).map(|e| e.timestamp).unwrap_or(Timestamp::ZERO);
                if ts > current {
                    map.insert(key, Entry { value, timestamp: ts });
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Local commit: stamps the write and stores it in one critical section,
    /// returning the assigned timestamp.
    pub fn commit(&self, key: String, value: String) -> Timestamp {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let timestamp = self.clock.tick();
        map.insert(key, Entry { value, timestamp });
        timestamp
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entry(key).map(|e| e.value)
    }

    pub fn entry(&self, key: &str) -> Option<Entry> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    /// Stored timestamp for `key`, zero if the key was never written.
    pub fn timestamp(&self, key: &str) -> Timestamp {
        self.entry(key).map(|e| e.timestamp).unwrap_or(Timestamp::ZERO)
    }

    /// Copy of every key and value, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.iter().map(|(k, e)| (k.clone(), e.value.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: f64) -> Option<Timestamp> {
        Some(Timestamp(secs))
    }

    #[test]
    fn unseen_key_accepts_any_positive_timestamp() {
        let store = TimestampedStore::new();
        assert!(store.set("x".into(), "1".into(), ts(0.5)));
        assert_eq!(store.get("x").as_deref(), Some("1"));
        assert_eq!(store.timestamp("x"), Timestamp(0.5));
    }

    #[test]
    fn missing_key_is_none() {
        let store = TimestampedStore::new();
        assert_eq!(store.get("nope"), None);
        assert_eq!(store.timestamp("nope"), Timestamp::ZERO);
        assert!(store.is_empty());
    }

    #[test]
    fn older_write_is_rejected() {
        let store = TimestampedStore::new();
        assert!(store.set("x".into(), "new".into(), ts(200.0)));
        assert!(!store.set("x".into(), "old".into(), ts(100.0)));
        assert_eq!(
            store.entry("x"),
            Some(Entry {
                value: "new".into(),
                timestamp: Timestamp(200.0)
            })
        );
    }

    #[test]
    fn equal_timestamp_replay_is_rejected() {
        let store = TimestampedStore::new();
        assert!(store.set("x".into(), "a".into(), ts(100.0)));
        assert!(!store.set("x".into(), "a".into(), ts(100.0)));
        assert!(!store.set("x".into(), "b".into(), ts(100.0)));
        assert_eq!(store.get("x").as_deref(), Some("a"));
    }

    #[test]
    fn zero_timestamp_never_wins() {
        let store = TimestampedStore::new();
        assert!(!store.set("x".into(), "a".into(), ts(0.0)));
        assert_eq!(store.get("x"), None);
    }

    #[test]
    fn keys_are_independent() {
        let store = TimestampedStore::new();
        assert!(store.set("a".into(), "1".into(), ts(300.0)));
        assert!(store.set("b".into(), "2".into(), ts(100.0)));
        assert_eq!(store.len(), 2);
        let snap = store.snapshot();
        assert_eq!(snap.get("a").map(String::as_str), Some("1"));
        assert_eq!(snap.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn commit_without_timestamp_always_wins_and_is_stamped() {
        let store = TimestampedStore::new();
        assert!(store.set("x".into(), "1".into(), None));
        let first = store.timestamp("x");
        assert!(first > Timestamp::ZERO);

        let second = store.commit("x".into(), "2".into());
        assert!(second > first);
        assert_eq!(store.get("x").as_deref(), Some("2"));
        assert_eq!(store.timestamp("x"), second);
    }

    #[test]
    fn final_value_has_the_max_timestamp_in_any_order() {
        let writes = [(5.0, "e"), (1.0, "a"), (9.0, "i"), (3.0, "c"), (9.0, "dup"), (7.0, "g")];
        let store = TimestampedStore::new();
        let mut accepted = Vec::new();
        for (t, v) in writes {
            if store.set("k".into(), v.into(), ts(t)) {
                accepted.push(t);
            }
        }
        assert_eq!(accepted, vec![5.0, 9.0]);
        assert_eq!(store.get("k").as_deref(), Some("i"));
    }

    #[test]
    fn concurrent_sets_keep_the_newest() {
        use std::sync::Arc;

        let store = Arc::new(TimestampedStore::new());
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..500u32 {
                        let stamp = f64::from(i * 8 + t + 1);
                        store.set("hot".into(), stamp.to_string(), Some(Timestamp(stamp)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.timestamp("hot"), Timestamp(4000.0));
        assert_eq!(store.get("hot").as_deref(), Some("4000"));
    }
}
