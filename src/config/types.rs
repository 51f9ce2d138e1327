use serde::Deserialize;
use url::Url;

/// Main configuration structure for Bookshelf-ETL
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub database: DatabaseConfig,
}

/// Catalog site layout and the categories to scrape
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog root that item detail paths are joined onto
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Whether to follow the "next" link on category listings
    #[serde(rename = "follow-pagination")]
    pub follow_pagination: bool,

    /// Upper bound on listing pages read per category
    #[serde(rename = "max-listing-pages")]
    pub max_listing_pages: u32,

    /// Categories to scrape, in order
    #[serde(rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

/// One category listing to scrape
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Label stamped on every record of this category
    pub label: String,

    /// Listing path relative to the catalog base URL
    pub path: String,
}

/// Retry and timeout settings for catalog requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total request budget per URL, shared by every retry reason
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause after an HTTP 429 response (seconds)
    #[serde(rename = "rate-limit-backoff-secs")]
    pub rate_limit_backoff_secs: u64,

    /// Pause after any other non-200 response (milliseconds)
    #[serde(rename = "status-retry-delay-ms")]
    pub status_retry_delay_ms: u64,

    /// Pause after a connection failure or timeout (milliseconds)
    #[serde(rename = "network-retry-delay-ms")]
    pub network_retry_delay_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

/// User agent identification
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub name: String,
    pub version: String,
}

/// File-mode output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination of the delimited file
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

/// Database-mode output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Table the records are appended to
    pub table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://books.toscrape.com/catalogue/".to_string(),
            follow_pagination: true,
            max_listing_pages: 50,
            categories: vec![
                CategoryEntry {
                    label: "Science".to_string(),
                    path: "category/books/science_22/index.html".to_string(),
                },
                CategoryEntry {
                    label: "Poetry".to_string(),
                    path: "category/books/poetry_23/index.html".to_string(),
                },
            ],
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_backoff_secs: 60,
            status_retry_delay_ms: 0,
            network_retry_delay_ms: 0,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "data.csv".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "book_db.sqlite3".to_string(),
            table: "BooksToScrape".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Returns the catalog base as a URL that relative paths can be joined onto
    pub fn base(&self) -> Result<Url, url::ParseError> {
        if self.base_url.ends_with('/') {
            Url::parse(&self.base_url)
        } else {
            Url::parse(&format!("{}/", self.base_url))
        }
    }

    /// Builds the absolute listing URL for a category
    pub fn category_url(&self, category: &CategoryEntry) -> Result<Url, url::ParseError> {
        self.base()?.join(&category.path)
    }
}
