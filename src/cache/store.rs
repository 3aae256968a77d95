use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Request parameters. A `BTreeMap` iterates in lexicographic key order, so
/// two logically identical parameter sets always serialize the same way
/// regardless of insertion order.
pub type Params = BTreeMap<String, String>;

/// Serialize parameters as `key=value` pairs joined with `&`, in sorted key
/// order, with keys and values form-urlencoded. Shared by cache-key
/// generation and URL building so a request and its cache identity can
/// never disagree.
pub fn query_string(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(part: &str) -> String {
    url::form_urlencoded::byte_serialize(part.as_bytes()).collect()
}

/// Deterministic cache identity for an (endpoint, parameters) pair.
pub fn cache_key(endpoint: &str, params: &Params) -> String {
    if params.is_empty() {
        endpoint.to_string()
    } else {
        format!("{}?{}", endpoint, query_string(params))
    }
}

/// A cached response and the instant it was stored.
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    /// Age of this entry. Negative durations from clock skew clamp to zero.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// In-memory cache keyed by request identity.
///
/// Unbounded; the only eviction is expiry-on-read. `get` never returns an
/// entry whose age has reached the expiry.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    expiry: Duration,
}

impl CacheStore {
    pub fn new(expiry: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            expiry,
        }
    }

    /// Look up a key, evicting the entry if it has gone stale.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.age() >= self.expiry {
            debug!(key, "evicting stale cache entry");
            self.entries.remove(key);
            return None;
        }
        Some(self.entries[key].data.clone())
    }

    /// Insert or overwrite an entry, timestamped now.
    pub fn set(&mut self, key: String, data: Value) {
        self.entries.insert(key, CacheEntry::new(data));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Currently cached keys, sorted for deterministic output.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Backdate an entry's timestamp. Test hook for expiry behavior.
    #[cfg(test)]
    pub fn backdate(&mut self, key: &str, age: chrono::Duration) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.cached_at = Utc::now() - age;
        }
    }
}
