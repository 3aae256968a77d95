//! Data-access layer over the remote REST API.
//!
//! This module provides the `DataAccessManager`, which owns the HTTP client,
//! the response cache, the request counter, and the single in-flight
//! cancellation slot. All network access in the crate goes through it.

pub mod error;
pub mod manager;

pub use error::FetchError;
pub use manager::{DataAccessManager, ManagerStats};

pub use crate::cache::Params;
