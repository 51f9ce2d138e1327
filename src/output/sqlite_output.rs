//! SQLite-based record sink
//!
//! Opens the configured database for every batch, appends the rows in one transaction
//! and closes the connection again.

use crate::config::DatabaseConfig;
use crate::output::traits::{OutputResult, RecordSink};
use crate::record::CleanRecord;
use crate::storage::SqliteStorage;
use std::path::PathBuf;

/// Appends records to a SQLite table
pub struct SqliteSink {
    path: PathBuf,
    table: String,
}

impl SqliteSink {
    /// Creates a sink for the database and table named in `config`
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            table: config.table.clone(),
        }
    }
}

impl RecordSink for SqliteSink {
    fn load(&mut self, batch: &[CleanRecord]) -> OutputResult<usize> {
        let inserted = SqliteStorage::new(&self.path, &self.table)
            .and_then(|mut storage| storage.insert_records(batch))
            .map_err(|e| {
                tracing::error!("Failed to load data into {}: {}", self.describe(), e);
                e
            })?;

        tracing::info!(
            "Successfully uploaded {} records to {}",
            inserted,
            self.describe()
        );
        Ok(inserted)
    }

    fn describe(&self) -> String {
        format!("table {} in {}", self.table, self.path.display())
    }
}
