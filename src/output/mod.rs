//! Output module for loading cleaned batches
//!
//! This module handles:
//! - Appending batches to a delimited file (file mode)
//! - Appending batches to a SQLite table (database mode)
//! - Selecting the sink from the operational mode flag

mod csv_output;
mod sqlite_output;
mod traits;

pub use csv_output::{write_row, CsvSink};
pub use sqlite_output::SqliteSink;
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::config::Config;

/// Where cleaned batches go; the two modes are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Append to the delimited file at `output.csv-path`
    File,
    /// Append to the table at `database.path` / `database.table`
    #[default]
    Database,
}

impl LoadMode {
    /// Maps the `--no-db` switch onto a mode
    pub fn from_no_db_flag(no_db: bool) -> Self {
        if no_db {
            Self::File
        } else {
            Self::Database
        }
    }
}

/// Builds the sink for `mode` from the configuration
pub fn open_sink(config: &Config, mode: LoadMode) -> Box<dyn RecordSink> {
    match mode {
        LoadMode::File => Box::new(CsvSink::new(&config.output.csv_path)),
        LoadMode::Database => Box::new(SqliteSink::new(&config.database)),
    }
}
