//! Fingerprint-keyed result cache.
//!
//! Keys are the deterministic request fingerprints, so equal requests map to
//! the same entry regardless of how the caller spelled the filter. Entries
//! are inserted whole and expire by TTL, pruned lazily on the query path
//! (an expired hit is removed in `get`; `insert` drops everything expired
//! before adding). Two concurrent queries for the same fingerprint may both
//! execute; the later insert wins. Redundant host work is acceptable,
//! blocking one query on another's execution is not.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::pipeline::QueryResponse;

struct CacheEntry {
    response: QueryResponse,
    inserted: Instant,
}

pub struct ResultCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<QueryResponse> {
        {
            let entries = self.entries.read();
            let entry = entries.get(fingerprint)?;
            if entry.inserted.elapsed() < self.ttl {
                return Some(entry.response.clone());
            }
        }
        // Expired: remove rather than just miss, so a re-queried key does
        // not hold its stale entry until the next insert prunes it.
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(fingerprint) {
            if entry.inserted.elapsed() >= self.ttl {
                entries.remove(fingerprint);
            }
        }
        None
    }

    /// Insert prunes everything expired first. Filters with relative date
    /// tokens fingerprint to a fresh key per query, so those entries are
    /// never looked up again; without pruning here the map would only grow.
    pub fn insert(&self, fingerprint: String, response: QueryResponse) {
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.inserted.elapsed() < self.ttl);
        entries.insert(
            fingerprint,
            CacheEntry {
                response,
                inserted: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::QueryMetadata;

    fn response() -> QueryResponse {
        QueryResponse {
            records: Vec::new(),
            metadata: QueryMetadata {
                mode: "all".to_string(),
                filters_applied: 0,
                sort_applied: Vec::new(),
                total_count: 0,
            },
        }
    }

    #[test]
    fn fresh_entries_hit() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.insert("fnv1a64:abc".to_string(), response());
        assert!(cache.get("fnv1a64:abc").is_some());
        assert!(cache.get("fnv1a64:other").is_none());
    }

    #[test]
    fn expired_entries_miss_and_are_removed() {
        let cache = ResultCache::new(Duration::ZERO);
        cache.insert("fnv1a64:abc".to_string(), response());
        assert!(cache.get("fnv1a64:abc").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_prunes_expired_entries_with_other_keys() {
        // Fingerprints from relative-token filters are never re-queried;
        // insert has to prune them or the map grows per query.
        let cache = ResultCache::new(Duration::ZERO);
        cache.insert("fnv1a64:aaa".to_string(), response());
        cache.insert("fnv1a64:bbb".to_string(), response());
        cache.insert("fnv1a64:ccc".to_string(), response());
        assert_eq!(cache.len(), 1);
    }
}
