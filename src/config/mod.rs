//! Configuration module for Bookshelf-ETL
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section falls back to the built-in defaults, so an empty file (or no file
//! at all) yields the stock catalog scrape of the Science and Poetry categories.
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_etl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("bookshelf.toml")).unwrap();
//! println!("Scraping {} categories", config.catalog.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, CategoryEntry, Config, DatabaseConfig, FetchConfig, OutputConfig,
    UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
