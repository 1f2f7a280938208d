use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use logsift_store::RecordStore;
use logsift_types::{FailureReason, IngestResult};

use crate::error::IngestError;
use crate::parser::LineParser;

/// Feeds log lines through the parser into a record store
///
/// A bad line is recorded in the result and never stops the batch.
pub struct IngestionPipeline<'a> {
    store: &'a RecordStore,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Ingest lines in order, numbering them from 1
    pub fn ingest<I, S>(&self, lines: I) -> IngestResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = IngestResult::default();
        for (idx, line) in lines.into_iter().enumerate() {
            self.ingest_line(&mut result, idx as u64 + 1, line.as_ref());
        }
        Self::report(&result);
        result
    }

    /// Ingest every line of a file
    ///
    /// Fails before reading anything if the file is absent. Lines that are
    /// not UTF-8 become per-line failures; a read error aborts the ingest.
    pub fn ingest_file(&self, path: impl AsRef<Path>) -> Result<IngestResult, IngestError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => IngestError::SourceNotFound(path.to_path_buf()),
            _ => IngestError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        tracing::info!(path = %path.display(), "ingesting log file");

        let mut result = IngestResult::default();
        for (idx, chunk) in BufReader::new(file).split(b'\n').enumerate() {
            let line_number = idx as u64 + 1;
            let bytes = chunk.map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            match String::from_utf8(bytes) {
                Ok(line) => self.ingest_line(&mut result, line_number, &line),
                Err(_) => {
                    tracing::debug!(line_number, "skipping line with invalid UTF-8");
                    result.record_failure(line_number, FailureReason::InvalidEncoding);
                }
            }
        }

        Self::report(&result);
        Ok(result)
    }

    fn ingest_line(&self, result: &mut IngestResult, line_number: u64, raw: &str) {
        let record = match LineParser::parse(raw.trim()).into_result() {
            Ok(record) => record,
            Err(reason) => {
                tracing::debug!(line_number, %reason, "line rejected");
                result.record_failure(line_number, reason);
                return;
            }
        };

        match self.store.append(&record) {
            Ok(_) => result.record_success(),
            Err(e) => {
                tracing::warn!(line_number, error = %e, "failed to store record");
                result.record_failure(line_number, FailureReason::Store(e.to_string()));
            }
        }
    }

    fn report(result: &IngestResult) {
        tracing::info!(
            attempted = result.attempted,
            inserted = result.inserted,
            failed = result.failed(),
            "ingest finished"
        );
    }
}
