//! In-memory response cache.
//!
//! This module provides the `CacheStore` that keeps successful API responses
//! keyed by request identity. Entries are timestamped on insert and evicted
//! on read once their age reaches the configured expiry; there is no other
//! eviction policy and no persistence.

pub mod store;

pub use store::{cache_key, query_string, CacheEntry, CacheStore, Params};
