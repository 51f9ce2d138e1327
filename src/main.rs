//! Bookshelf-ETL main entry point
//!
//! This is the command-line interface for the book catalog pipeline.

use bookshelf_etl::config::{load_config_or_default, Config};
use bookshelf_etl::crawler::run_pipeline;
use bookshelf_etl::storage::init_database;
use bookshelf_etl::LoadMode;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bookshelf-ETL: scrape a book catalog into a file or a database
///
/// Fetches every title in the configured categories, extracts its product
/// information, normalizes prices and stock counts, and appends the rows to
/// a SQLite table (default) or a delimited file (--no-db).
#[derive(Parser, Debug)]
#[command(name = "bookshelf-etl")]
#[command(version)]
#[command(about = "Scrape a book catalog into a file or a database", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Append to the delimited file instead of the database
    #[arg(long)]
    no_db: bool,

    /// Create the database and books table if missing, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_db"])]
    init_db: bool,

    /// Show the resolved configuration and category URLs without fetching
    #[arg(long, conflicts_with = "init_db")]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_config_or_default(cli.config.as_deref()) {
        Ok(cfg) => {
            match &cli.config {
                Some(path) => tracing::info!("Configuration loaded from {}", path.display()),
                None => tracing::info!("Using built-in configuration"),
            }
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mode = LoadMode::from_no_db_flag(cli.no_db);

    if cli.init_db {
        handle_init_db(&config)?;
    } else if cli.dry_run {
        handle_dry_run(&config, mode)?;
    } else {
        handle_run(config, mode).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookshelf_etl=info,warn"),
            1 => EnvFilter::new("bookshelf_etl=debug,info"),
            2 => EnvFilter::new("bookshelf_etl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --init-db: creates the database and table
fn handle_init_db(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match init_database(&config.database) {
        Ok(_) => {
            println!(
                "✓ Table {} ready in database file {}",
                config.database.table, config.database.path
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to create database file: {}", e);
            Err(e.into())
        }
    }
}

/// Handles --dry-run: prints what a run would do
fn handle_dry_run(config: &Config, mode: LoadMode) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bookshelf-ETL Dry Run ===\n");

    println!("Catalog: {}", config.catalog.base_url);
    println!(
        "  Follow pagination: {} (max {} pages)",
        config.catalog.follow_pagination, config.catalog.max_listing_pages
    );

    println!("\nCategories ({}):", config.catalog.categories.len());
    for category in &config.catalog.categories {
        let url = config.catalog.category_url(category)?;
        println!("  - {}: {}", category.label, url);
    }

    println!("\nFetch policy:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!(
        "  Rate limit backoff: {}s",
        config.fetch.rate_limit_backoff_secs
    );
    println!("  Status retry delay: {}ms", config.fetch.status_retry_delay_ms);
    println!(
        "  Network retry delay: {}ms",
        config.fetch.network_retry_delay_ms
    );

    println!("\nOutput:");
    match mode {
        LoadMode::File => println!("  File: {}", config.output.csv_path),
        LoadMode::Database => println!(
            "  Database: {} (table {})",
            config.database.path, config.database.table
        ),
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(config: Config, mode: LoadMode) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Scraping {} categories in {:?} mode",
        config.catalog.categories.len(),
        mode
    );

    match run_pipeline(config, mode).await {
        Ok(report) => {
            for category in &report.categories {
                tracing::info!(
                    "{}: {} links, {} records loaded",
                    category.label,
                    category.links_found,
                    category.records_loaded
                );
            }
            tracing::info!("Pipeline finished, {} records loaded", report.total_loaded());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
