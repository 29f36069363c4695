//! Read-through response cache.
//!
//! A small in-process key → serialized-response map with time-based
//! expiry, used only to shave redundant reads off the list endpoints.
//! Every failure mode degrades to a cache miss; nothing in here may ever
//! surface as a request failure.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Entries beyond this are evicted oldest-first on insert.
const MAX_ENTRIES: usize = 1024;

#[derive(Debug)]
struct Entry {
    stored_at: Instant,
    body: String,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a still-fresh entry. A poisoned lock or expired entry is a
    /// miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        (entry.stored_at.elapsed() < self.ttl).then(|| entry.body.clone())
    }

    /// Store a response body. Failures are swallowed.
    pub fn put(&self, key: &str, body: String) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= MAX_ENTRIES && !entries.contains_key(key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                body,
            },
        );
    }

    /// Round-trip self-check used by the health endpoint.
    pub fn check(&self) -> Result<(), String> {
        self.put("__health__", "ok".into());
        match self.get("__health__") {
            Some(v) if v == "ok" => Ok(()),
            _ => Err("cache read/write failed".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("k", "v".into());
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.put("k", "v".into());
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_unknown_key_is_a_miss() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_health_check_roundtrip() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        assert!(cache.check().is_ok());
    }

    #[test]
    fn test_eviction_keeps_map_bounded() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        for i in 0..(MAX_ENTRIES + 10) {
            cache.put(&format!("k{i}"), "v".into());
        }
        let len = cache.entries.read().unwrap().len();
        assert!(len <= MAX_ENTRIES);
    }
}
