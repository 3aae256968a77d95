//! Dashcache - a cached data-access layer for REST dashboards.
//!
//! This crate provides the [`DataAccessManager`], which turns logical read
//! requests (endpoint + parameters) into cache lookups or HTTP GET calls.
//! Failed calls are retried with a fixed delay, successful responses are
//! cached with a TTL, and a newer fetch cancels the one still in flight.
//! Presentation code consumes the manager through its event stream and the
//! asynchronous filter/sort/search helpers.

pub mod api;
pub mod cache;
pub mod config;
pub mod events;
pub mod query;

pub use api::{DataAccessManager, FetchError, ManagerStats, Params};
pub use config::ManagerConfig;
pub use events::{EventKind, ListenerId, ManagerEvent};
