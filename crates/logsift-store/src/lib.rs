//! Record storage for logsift
//!
//! This crate provides the SQLite-backed record table and the query builder
//! that turns a [`FilterSpec`] into a parameterized predicate.

mod error;
mod query;
mod store;

pub use error::{Result, StoreError};
pub use query::{Query, QueryBuilder};
pub use store::RecordStore;

// Re-export types used in our public API
pub use logsift_types::{FilterSpec, LogRecord, RecordId, StoredRecord};
