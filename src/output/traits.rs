//! Output sink trait and error types
//!
//! This module defines the interface every record destination implements.

use crate::record::CleanRecord;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A destination cleaned batches are appended to
///
/// Each call to [`RecordSink::load`] is one batch. Sinks open their underlying
/// resource per call; nothing spans two batches.
pub trait RecordSink {
    /// Appends a batch and returns the number of records written
    fn load(&mut self, batch: &[CleanRecord]) -> OutputResult<usize>;

    /// Short human-readable name of the destination, for logs
    fn describe(&self) -> String;
}
