use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the record store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened at the given location
    #[error("cannot open database {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value does not fit the column type
    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: u64 },
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::OutOfRange {
            field: "size",
            value: u64::MAX,
        };
        assert_eq!(
            err.to_string(),
            format!("size value {} is out of range", u64::MAX)
        );

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io_err.into();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StoreError>();
    }
}
