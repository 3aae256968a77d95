//! Lifecycle event notification.
//!
//! The manager publishes events at fixed points of the request lifecycle so
//! presentation code can drive status indicators without being wired into
//! the data path. Callbacks run synchronously at the point of emission, in
//! registration order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// The event categories a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RequestStarted,
    RequestSuccess,
    RequestError,
    CacheHit,
    CacheUpdated,
    CacheCleared,
}

/// A lifecycle event with its payload.
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    /// A network attempt was dispatched (retries included).
    RequestStarted,
    /// A network attempt succeeded and its body parsed.
    RequestSuccess,
    /// All attempts failed; carries the final error text. Cancellations are
    /// never reported here.
    RequestError(String),
    /// A fetch was served from cache without touching the network.
    CacheHit { key: String },
    /// A response was stored under `key`.
    CacheUpdated { key: String },
    /// The cache was emptied wholesale.
    CacheCleared,
}

impl ManagerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ManagerEvent::RequestStarted => EventKind::RequestStarted,
            ManagerEvent::RequestSuccess => EventKind::RequestSuccess,
            ManagerEvent::RequestError(_) => EventKind::RequestError,
            ManagerEvent::CacheHit { .. } => EventKind::CacheHit,
            ManagerEvent::CacheUpdated { .. } => EventKind::CacheUpdated,
            ManagerEvent::CacheCleared => EventKind::CacheCleared,
        }
    }
}

/// Handle identifying a registered listener, used to remove it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ManagerEvent) + Send + Sync>;

/// Observer registry keyed by event kind.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one event kind. The returned id removes it.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&ManagerEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.lock().expect("event bus lock poisoned");
        listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a listener by its id. Returns whether anything was removed.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("event bus lock poisoned");
        if let Some(entries) = listeners.get_mut(&kind) {
            let before = entries.len();
            entries.retain(|(entry_id, _)| *entry_id != id);
            return entries.len() < before;
        }
        false
    }

    /// Invoke every listener registered for this event's kind, in
    /// registration order. Listeners are cloned out of the lock first so a
    /// callback may re-enter the bus (or the manager) without deadlocking.
    pub fn emit(&self, event: &ManagerEvent) {
        let callbacks: Vec<Listener> = {
            let listeners = self.listeners.lock().expect("event bus lock poisoned");
            listeners
                .get(&event.kind())
                .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}
