use std::path::PathBuf;

use thiserror::Error;

/// Source-level failures that stop an ingest before it produces a result
#[derive(Debug, Error)]
pub enum IngestError {
    /// The log file does not exist
    #[error("log source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The log file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::SourceNotFound(PathBuf::from("logs/access.log"));
        assert_eq!(err.to_string(), "log source not found: logs/access.log");

        let err = IngestError::Io {
            path: PathBuf::from("logs/access.log"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        };
        assert_eq!(err.to_string(), "failed to read logs/access.log: disk on fire");
    }
}
