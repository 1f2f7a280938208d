//! Log processing for logsift
//!
//! This crate provides access-log line parsing and the ingestion pipeline
//! that feeds parsed records into a [`RecordStore`].

mod error;
mod ingest;
mod parser;

pub use error::IngestError;
pub use ingest::IngestionPipeline;
pub use parser::{LineParser, ParseOutcome};

// Re-export types used in our public API
pub use logsift_store::RecordStore;
pub use logsift_types::{FailureReason, IngestResult, LineFailure, LogRecord};
