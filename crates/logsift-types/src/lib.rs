//! Shared types for logsift
//!
//! This crate contains data structures used across multiple logsift crates.

use serde::Serialize;
use std::fmt;

/// Number of rows returned by a query when no limit is given
pub const DEFAULT_LIMIT: usize = 100;

// ============================================================================
// Record Types
// ============================================================================

/// Identifier assigned by the store to each appended record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single parsed access-log line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Client address token, as it appeared in the line
    pub ip: String,

    /// ISO-8601 instant, or the raw bracketed date when it could not be parsed
    pub timestamp: String,

    /// First token of the request line (empty if missing)
    pub method: String,

    /// Second token of the request line (empty if missing)
    pub url: String,

    /// HTTP status code
    pub status: u32,

    /// Response size in bytes
    pub size: u64,

    /// User agent, `None` when the line carried `-`
    pub user_agent: Option<String>,
}

impl LogRecord {
    pub fn new(
        ip: String,
        timestamp: String,
        method: String,
        url: String,
        status: u32,
        size: u64,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            ip,
            timestamp,
            method,
            url,
            status,
            size,
            user_agent,
        }
    }
}

/// A record as read back from the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: LogRecord,
}

// ============================================================================
// Query Types
// ============================================================================

/// Optional constraints for a record query
///
/// Every present field narrows the result (AND). Empty strings count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Exact match on the client address
    pub ip: Option<String>,

    /// Substring of the URL
    pub keyword: Option<String>,

    /// Lower bound on the timestamp (inclusive, string comparison)
    pub date_from: Option<String>,

    /// Upper bound on the timestamp (inclusive, string comparison)
    pub date_to: Option<String>,

    /// Maximum number of rows (defaults to [`DEFAULT_LIMIT`])
    pub limit: Option<usize>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = non_empty(ip.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = non_empty(keyword.into());
        self
    }

    pub fn with_date_from(mut self, date_from: impl Into<String>) -> Self {
        self.date_from = non_empty(date_from.into());
        self
    }

    pub fn with_date_to(mut self, date_to: impl Into<String>) -> Self {
        self.date_to = non_empty(date_to.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Drop any field holding an empty string
    pub fn normalized(self) -> Self {
        Self {
            ip: self.ip.and_then(non_empty),
            keyword: self.keyword.and_then(non_empty),
            date_from: self.date_from.and_then(non_empty),
            date_to: self.date_to.and_then(non_empty),
            limit: self.limit,
        }
    }

    /// Row cap to apply
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

// ============================================================================
// Ingest Types
// ============================================================================

/// Why a source line did not become a stored record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The line does not fit the access-log grammar
    NoMatch,
    /// The line matched but a numeric field did not convert
    FieldConversion { field: &'static str, value: String },
    /// The line is not valid UTF-8
    InvalidEncoding,
    /// The record parsed but the store rejected it
    Store(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "line does not match the access-log format"),
            Self::FieldConversion { field, value } => {
                write!(f, "invalid {field} value {value:?}")
            }
            Self::InvalidEncoding => write!(f, "line is not valid UTF-8"),
            Self::Store(message) => write!(f, "store error: {message}"),
        }
    }
}

/// A failed line, numbered from 1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineFailure {
    pub line_number: u64,
    pub reason: FailureReason,
}

impl LineFailure {
    pub fn new(line_number: u64, reason: FailureReason) -> Self {
        Self {
            line_number,
            reason,
        }
    }
}

/// Outcome of ingesting one source
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestResult {
    /// Every line seen, blank ones included
    pub attempted: u64,

    /// Lines that were appended to the store
    pub inserted: u64,

    /// Failed lines in source order
    pub failures: Vec<LineFailure>,
}

impl IngestResult {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.inserted += 1;
    }

    pub fn record_failure(&mut self, line_number: u64, reason: FailureReason) {
        self.attempted += 1;
        self.failures.push(LineFailure::new(line_number, reason));
    }

    /// Number of lines that did not make it into the store
    pub fn failed(&self) -> u64 {
        self.attempted - self.inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder_ignores_empty_values() {
        let spec = FilterSpec::new()
            .with_ip("")
            .with_keyword("admin")
            .with_date_from("");
        assert_eq!(spec.ip, None);
        assert_eq!(spec.keyword.as_deref(), Some("admin"));
        assert_eq!(spec.date_from, None);
    }

    #[test]
    fn test_filter_normalized_drops_empty_strings() {
        let spec = FilterSpec {
            ip: Some(String::new()),
            date_to: Some("2024-01-01".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(spec.ip, None);
        assert_eq!(spec.date_to.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_default_limit() {
        assert_eq!(FilterSpec::new().effective_limit(), DEFAULT_LIMIT);
        assert_eq!(FilterSpec::new().with_limit(5).effective_limit(), 5);
    }

    #[test]
    fn test_ingest_result_counts() {
        let mut result = IngestResult::default();
        result.record_success();
        result.record_failure(2, FailureReason::NoMatch);
        result.record_success();

        assert_eq!(result.attempted, 3);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.failures, vec![LineFailure::new(2, FailureReason::NoMatch)]);
    }

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::FieldConversion {
            field: "size",
            value: "-".to_string(),
        };
        assert_eq!(reason.to_string(), "invalid size value \"-\"");
    }

    #[test]
    fn test_stored_record_serializes_flat() {
        let stored = StoredRecord {
            id: RecordId(7),
            record: LogRecord::new(
                "10.0.0.1".to_string(),
                "2023-10-10T13:55:36+00:00".to_string(),
                "GET".to_string(),
                "/".to_string(),
                200,
                512,
                None,
            ),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["ip"], "10.0.0.1");
        assert!(json["user_agent"].is_null());
    }
}
