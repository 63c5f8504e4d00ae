//! The `services` module provides a high-level API for interacting with the
//! database. It encapsulates the query logic and data access patterns so the
//! rest of the application (HTTP handlers, the sync service) can work with
//! domain models without knowing about the underlying schema.
//!
//! One sub-module per domain entity; all public functions are re-exported here
//! for access under the `crate::db::services::` path.

pub mod link_service;
pub mod program_service;
pub mod stats_service;

pub use link_service::*;
pub use program_service::*;
pub use stats_service::*;
