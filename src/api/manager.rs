//! The data-access manager: cached fetches with retry and cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{cache_key, query_string, CacheStore, Params};
use crate::config::ManagerConfig;
use crate::events::{EventBus, EventKind, ListenerId, ManagerEvent};
use crate::query;

use super::FetchError;

/// Read-only snapshot of manager state.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStats {
    /// Number of entries currently cached.
    pub cache_size: usize,
    /// Network attempts made so far, retries included. Cache hits do not
    /// count.
    pub request_count: u64,
    /// Currently cached keys, sorted.
    pub cached_keys: Vec<String>,
}

struct ManagerInner {
    client: Client,
    config: ManagerConfig,
    cache: Mutex<CacheStore>,
    request_count: AtomicU64,
    /// The cancellation token of the request currently in flight, if any.
    /// A new fetch notifies the old token before installing its own.
    in_flight: Mutex<Option<Arc<Notify>>>,
    /// The single pending debounce timer. A new trigger aborts it.
    debounce_timer: Mutex<Option<JoinHandle<()>>>,
    events: EventBus,
}

/// Manages all data access for a dashboard: translates (endpoint, params)
/// requests into cache lookups or HTTP GETs, retries failures with a fixed
/// delay, caches successes with a TTL, and cancels superseded requests.
///
/// Clone is cheap - all state lives behind one `Arc`, so clones share the
/// cache, counters, and event listeners.
#[derive(Clone)]
pub struct DataAccessManager {
    inner: Arc<ManagerInner>,
}

impl DataAccessManager {
    pub fn new(config: ManagerConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let cache = CacheStore::new(config.cache_expiry);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                client,
                config,
                cache: Mutex::new(cache),
                request_count: AtomicU64::new(0),
                in_flight: Mutex::new(None),
                debounce_timer: Mutex::new(None),
                events: EventBus::new(),
            }),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    // ===== Events =====

    /// Subscribe to a lifecycle event. The returned id removes the listener.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&ManagerEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, callback)
    }

    /// Unsubscribe a listener previously registered with [`on`](Self::on).
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.events.off(kind, id)
    }

    // ===== Cache =====

    /// Look up a key directly, evicting it if stale. No event is emitted;
    /// `fetch_data` emits `CacheHit` when it serves from cache.
    pub fn get_cache(&self, key: &str) -> Option<Value> {
        self.inner.cache.lock().expect("cache lock poisoned").get(key)
    }

    /// Store a response under a key and announce the update.
    pub fn set_cache(&self, key: String, data: Value) {
        self.inner
            .cache
            .lock()
            .expect("cache lock poisoned")
            .set(key.clone(), data);
        self.inner.events.emit(&ManagerEvent::CacheUpdated { key });
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.inner.cache.lock().expect("cache lock poisoned").clear();
        self.inner.events.emit(&ManagerEvent::CacheCleared);
    }

    pub fn stats(&self) -> ManagerStats {
        let cache = self.inner.cache.lock().expect("cache lock poisoned");
        ManagerStats {
            cache_size: cache.len(),
            request_count: self.inner.request_count.load(Ordering::Relaxed),
            cached_keys: cache.keys(),
        }
    }

    // ===== Fetching =====

    /// Fetch an endpoint, serving from cache when possible.
    ///
    /// A valid cache hit returns immediately without touching the network or
    /// the request counter. On a miss, any request still in flight on this
    /// manager is cancelled first - only the most recent caller's request
    /// may complete. Successful responses are cached under the computed key
    /// unless `use_cache` is false.
    pub async fn fetch_data(
        &self,
        endpoint: &str,
        params: &Params,
        use_cache: bool,
    ) -> Result<Value, FetchError> {
        let key = cache_key(endpoint, params);

        if use_cache {
            if let Some(data) = self.get_cache(&key) {
                debug!(key = %key, "serving fetch from cache");
                self.inner
                    .events
                    .emit(&ManagerEvent::CacheHit { key: key.clone() });
                return Ok(data);
            }
        }

        // Supersede whatever is in flight and install our own token. The
        // stored permit in notify_one covers the window before the old task
        // reaches its notified().await.
        let token = Arc::new(Notify::new());
        {
            let mut in_flight = self.inner.in_flight.lock().expect("in-flight lock poisoned");
            if let Some(previous) = in_flight.take() {
                debug!(key = %key, "cancelling superseded in-flight request");
                previous.notify_one();
            }
            *in_flight = Some(Arc::clone(&token));
        }

        let url = self.build_url(endpoint, params);
        let result = tokio::select! {
            _ = token.notified() => Err(FetchError::Cancelled),
            result = self.fetch_with_retry(&url) => result,
        };

        // Release the slot, unless a newer request already replaced us.
        {
            let mut in_flight = self.inner.in_flight.lock().expect("in-flight lock poisoned");
            if in_flight
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &token))
            {
                *in_flight = None;
            }
        }

        let data = result?;
        if use_cache {
            self.set_cache(key, data.clone());
        }
        Ok(data)
    }

    /// GET a URL, retrying failed attempts with a fixed delay.
    ///
    /// Every attempt (the first one included) increments the request counter
    /// and emits `RequestStarted`. Non-2xx statuses and parse failures both
    /// consume one attempt. Once retries are exhausted the last error is
    /// emitted as `RequestError` and returned.
    pub async fn fetch_with_retry(&self, url: &str) -> Result<Value, FetchError> {
        let mut retries_left = self.inner.config.max_retries;

        loop {
            self.inner.request_count.fetch_add(1, Ordering::Relaxed);
            self.inner.events.emit(&ManagerEvent::RequestStarted);
            debug!(url, retries_left, "dispatching GET");

            match self.attempt(url).await {
                Ok(data) => {
                    self.inner.events.emit(&ManagerEvent::RequestSuccess);
                    return Ok(data);
                }
                Err(error) if retries_left > 0 => {
                    warn!(url, error = %error, retries_left, "attempt failed, retrying");
                    tokio::time::sleep(self.inner.config.retry_delay).await;
                    retries_left -= 1;
                }
                Err(error) => {
                    warn!(url, error = %error, "retries exhausted");
                    self.inner
                        .events
                        .emit(&ManagerEvent::RequestError(error.to_string()));
                    return Err(error);
                }
            }
        }
    }

    /// One network attempt: send, check status, read body, parse JSON.
    async fn attempt(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.inner.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status, &body));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn build_url(&self, endpoint: &str, params: &Params) -> String {
        let base = self.inner.config.base_url.trim_end_matches('/');
        let mut url = format!("{}{}", base, endpoint);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&query_string(params));
        }
        url
    }

    // ===== Derived endpoints =====

    /// All posts, unpaginated.
    pub async fn fetch_all_posts(&self) -> Result<Value, FetchError> {
        self.fetch_data("/posts", &Params::new(), true).await
    }

    /// All users.
    pub async fn fetch_users(&self) -> Result<Value, FetchError> {
        self.fetch_data("/users", &Params::new(), true).await
    }

    /// One page of posts. Pages are 1-based.
    pub async fn fetch_posts(&self, page: u32, limit: u32) -> Result<Value, FetchError> {
        let start = page.saturating_sub(1).saturating_mul(limit);
        let params: Params = [
            ("start".to_string(), start.to_string()),
            ("limit".to_string(), limit.to_string()),
        ]
        .into();
        self.fetch_data("/posts", &params, true).await
    }

    // ===== Collection operations =====
    //
    // Each yields back to the scheduler before doing any work, so a caller
    // driving a UI never blocks synchronously on a large collection.

    pub async fn filter_data<F>(&self, data: &[Value], predicate: F) -> Vec<Value>
    where
        F: Fn(&Value) -> bool,
    {
        tokio::task::yield_now().await;
        query::filter(data, predicate)
    }

    pub async fn sort_data(&self, data: &[Value], sort_key: &str, ascending: bool) -> Vec<Value> {
        tokio::task::yield_now().await;
        query::sort(data, sort_key, ascending)
    }

    /// Search `fields` for `query`; pass [`query::DEFAULT_SEARCH_FIELDS`]
    /// for the standard title/body search.
    pub async fn search_data(&self, data: &[Value], query: &str, fields: &[&str]) -> Vec<Value> {
        tokio::task::yield_now().await;
        query::search(data, query, fields)
    }

    // ===== Debounce =====

    /// Wrap a search callback in a debounced trigger using the configured
    /// delay. See [`debounce_search_with_delay`](Self::debounce_search_with_delay).
    pub fn debounce_search<T, F>(&self, callback: F) -> impl Fn(T)
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.debounce_search_with_delay(callback, self.inner.config.debounce_delay)
    }

    /// Wrap a callback in a debounced trigger: each invocation resets the
    /// manager's single pending timer, so within a burst only the last
    /// call's arguments reach `callback`, after `delay` of quiet.
    ///
    /// The trigger must be called from within a tokio runtime.
    pub fn debounce_search_with_delay<T, F>(&self, callback: F, delay: Duration) -> impl Fn(T)
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let callback = Arc::new(callback);

        move |args: T| {
            let callback = Arc::clone(&callback);
            let mut timer = inner.debounce_timer.lock().expect("debounce lock poisoned");
            if let Some(pending) = timer.take() {
                pending.abort();
            }
            *timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                callback(args);
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> DataAccessManager {
        DataAccessManager::new(ManagerConfig::default()).expect("failed to build manager")
    }

    #[test]
    fn test_build_url_no_params() {
        let m = manager();
        assert_eq!(
            m.build_url("/posts", &Params::new()),
            "https://jsonplaceholder.typicode.com/posts"
        );
    }

    #[test]
    fn test_build_url_params_sorted() {
        let m = manager();
        let params: Params = [
            ("start".to_string(), "10".to_string()),
            ("limit".to_string(), "5".to_string()),
        ]
        .into();
        assert_eq!(
            m.build_url("/posts", &params),
            "https://jsonplaceholder.typicode.com/posts?limit=5&start=10"
        );
    }

    #[test]
    fn test_build_url_trailing_slash_base() {
        let config = ManagerConfig::default().with_base_url("http://localhost:9999/");
        let m = DataAccessManager::new(config).unwrap();
        assert_eq!(m.build_url("/users", &Params::new()), "http://localhost:9999/users");
    }

    #[test]
    fn test_stats_start_empty() {
        let m = manager();
        let stats = m.stats();
        assert_eq!(stats.cache_size, 0);
        assert_eq!(stats.request_count, 0);
        assert!(stats.cached_keys.is_empty());
    }

    #[test]
    fn test_set_cache_emits_and_counts() {
        let m = manager();
        m.set_cache("/posts".to_string(), serde_json::json!([]));
        let stats = m.stats();
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.cached_keys, vec!["/posts"]);
        // Cache writes never touch the request counter
        assert_eq!(stats.request_count, 0);
    }

    #[test]
    fn test_clear_cache_resets_size() {
        let m = manager();
        m.set_cache("/posts".to_string(), serde_json::json!([1]));
        m.set_cache("/users".to_string(), serde_json::json!([2]));
        m.clear_cache();
        assert_eq!(m.stats().cache_size, 0);
    }
}
