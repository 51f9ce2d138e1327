//! SQLite storage implementation
//!
//! This module provides append-only access to the books table.

use crate::record::CleanRecord;
use crate::storage::schema::{initialize_schema, insert_sql};
use crate::storage::{StorageError, StorageResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend bound to one books table
pub struct SqliteStorage {
    conn: Connection,
    table: String,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database file and ensures the table exists
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Name of the books table
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path, table: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn, table)?;

        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(table: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Name of the table this storage writes to
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Appends a batch of records in a single transaction
    ///
    /// Returns the number of rows inserted.
    pub fn insert_records(&mut self, records: &[CleanRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(&insert_sql(&self.table))?;
            for record in records {
                inserted += stmt.execute(params![
                    record.title,
                    record.upc,
                    record.product_type,
                    record.price_excl_tax,
                    record.price_incl_tax,
                    record.tax,
                    record.availability,
                    record.number_of_reviews,
                    record.product_description,
                    record.category,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Counts all rows in the table
    pub fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| StorageError::Database(format!("bad row count {count}")))
    }

    /// Counts rows stamped with `category`
    pub fn count_by_category(&self, category: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE category = ?1", self.table),
            params![category],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| StorageError::Database(format!("bad row count {count}")))
    }

    /// Reads every row back in insertion order
    pub fn load_records(&self) -> StorageResult<Vec<CleanRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT title, upc, product_type, price_excl_tax, price_incl_tax, tax,
             availability, number_of_reviews, product_description, category
             FROM {} ORDER BY rowid",
            self.table
        ))?;

        let records = stmt
            .query_map([], |row| {
                Ok(CleanRecord {
                    title: row.get(0)?,
                    upc: row.get(1)?,
                    product_type: row.get(2)?,
                    price_excl_tax: row.get(3)?,
                    price_incl_tax: row.get(4)?,
                    tax: row.get(5)?,
                    availability: row.get(6)?,
                    number_of_reviews: row.get(7)?,
                    product_description: row.get(8)?,
                    category: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
