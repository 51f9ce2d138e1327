//! Delimited file sink
//!
//! The first write creates the file with a header line; later writes append rows only.

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::record::{CleanRecord, COLUMNS};
use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Appends records to a delimited text file
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a comma-delimited sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_batch(&self, batch: &[CleanRecord]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut w = BufWriter::new(file);

        if write_header {
            let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
            write_row(&mut w, &header, ',')?;
        }

        for record in batch {
            write_row(&mut w, &record.to_row(), ',')?;
        }

        w.flush()
    }
}

impl RecordSink for CsvSink {
    fn load(&mut self, batch: &[CleanRecord]) -> OutputResult<usize> {
        self.write_batch(batch).map_err(|source| OutputError::Write {
            path: self.path.display().to_string(),
            source,
        })?;

        tracing::info!(
            "Successfully uploaded {} records to {}",
            batch.len(),
            self.path.display()
        );
        Ok(batch.len())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Quotes a cell holding the separator, a quote or a line break
fn escape_cell(cell: &str, sep: char) -> Cow<'_, str> {
    if cell.contains(|c: char| c == sep || matches!(c, '"' | '\n' | '\r')) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

/// Writes a single delimited row, quoting cells that need it
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", sep)?;
        }
        w.write_all(escape_cell(cell, sep).as_bytes())?;
    }
    writeln!(w)
}
