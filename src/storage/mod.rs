//! Storage module for the books table
//!
//! This module handles all database operations, including:
//! - Creating the database file and books table (`--init-db`)
//! - Appending cleaned batches
//! - Reading rows back for reporting and tests

mod schema;
mod sqlite;

pub use schema::{create_table_sql, initialize_schema};
pub use sqlite::SqliteStorage;

use crate::config::DatabaseConfig;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Creates the database and books table if they do not already exist
///
/// # Arguments
///
/// * `config` - Database location and table name
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Storage ready for appends
/// * `Err(StorageError)` - Failed to create the database or table
pub fn init_database(config: &DatabaseConfig) -> StorageResult<SqliteStorage> {
    let storage = SqliteStorage::new(Path::new(&config.path), &config.table)?;
    tracing::info!(
        "Database file {} ready with table {}",
        config.path,
        config.table
    );
    Ok(storage)
}
