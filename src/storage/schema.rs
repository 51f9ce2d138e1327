//! Database schema definitions
//!
//! The books table has a fixed column set; only its name is configurable.

/// Builds the `CREATE TABLE IF NOT EXISTS` statement for the books table
///
/// `table` must already be a validated plain identifier.
pub fn create_table_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    title TEXT,
    upc TEXT,
    product_type TEXT,
    price_excl_tax DOUBLE,
    price_incl_tax DOUBLE,
    tax DOUBLE,
    availability INT,
    number_of_reviews INT,
    product_description TEXT,
    category TEXT
);
"#
    )
}

/// Builds the parameterized insert for the books table
pub fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (title, upc, product_type, price_excl_tax, price_incl_tax, tax,
         availability, number_of_reviews, product_description, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    )
}

/// Creates the books table if it does not exist
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `table` - The table name
pub fn initialize_schema(conn: &rusqlite::Connection, table: &str) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&create_table_sql(table))?;
    Ok(())
}
