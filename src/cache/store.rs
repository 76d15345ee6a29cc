// In-memory response cache.
// Stores decoded API responses keyed by request signature, with lazy TTL eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Default TTL for cached responses: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached response body with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Canonical request signature (URL + serialized options).
    pub key: String,
    /// The decoded response body.
    pub data: Value,
    /// When the entry was inserted.
    pub timestamp: Instant,
}

impl CacheEntry {
    /// Create a new entry stamped with the current instant.
    pub fn new(key: impl Into<String>, data: Value) -> Self {
        Self {
            key: key.into(),
            data,
            timestamp: Instant::now(),
        }
    }

    /// Check if this entry has outlived the TTL.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.timestamp.elapsed() >= ttl
    }

    /// Check if this entry is still valid (not expired).
    pub fn is_valid(&self, ttl: Duration) -> bool {
        !self.is_expired(ttl)
    }
}

/// Read-through response cache owned by a single client.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Look up a live entry, evicting it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_valid(self.ttl) => Some(entry.data.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a response body, replacing any previous entry for the key.
    pub fn insert(&mut self, key: impl Into<String>, data: Value) {
        let entry = CacheEntry::new(key, data);
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
