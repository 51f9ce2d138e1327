//! Pipeline driver - extract, transform and load orchestration
//!
//! This module runs the whole job for every configured category:
//! - Fetching each listing (and its follow-on pages) for item links
//! - Fetching and parsing every item detail page
//! - Cleaning each category batch and stamping its label
//! - Loading each batch into the selected sink
//!
//! Every stage finishes for all categories before the next stage starts, and
//! requests are made one at a time.

use crate::config::{validate, CategoryEntry, Config};
use crate::crawler::fetcher::{build_http_client, fetch_with_retry, FetchPolicy, FetchResult};
use crate::crawler::parser::{extract_item_links, extract_raw_record, next_page_url};
use crate::output::{open_sink, LoadMode, RecordSink};
use crate::record::{clean_batch, CleanRecord, RawRecord};
use crate::EtlError;
use reqwest::Client;
use url::Url;

/// Raw records scraped for one category
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub label: String,
    pub links_found: usize,
    pub records: Vec<RawRecord>,
}

/// Cleaned records for one category, ready to load
#[derive(Debug, Clone)]
pub struct CleanBatch {
    pub label: String,
    pub links_found: usize,
    pub records: Vec<CleanRecord>,
}

/// Per-category outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub label: String,
    pub links_found: usize,
    pub records_loaded: usize,
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub categories: Vec<CategoryReport>,
}

impl PipelineReport {
    /// Total records loaded across all categories
    pub fn total_loaded(&self) -> usize {
        self.categories.iter().map(|c| c.records_loaded).sum()
    }
}

/// Main pipeline driver
pub struct Pipeline {
    config: Config,
    client: Client,
    policy: FetchPolicy,
}

impl Pipeline {
    /// Creates a pipeline using the fetch policy from `config`
    pub fn new(config: Config) -> Result<Self, EtlError> {
        let policy = FetchPolicy::from(&config.fetch);
        Self::with_policy(config, policy)
    }

    /// Creates a pipeline with an explicit fetch policy
    ///
    /// The configuration is validated first, so the table name that ends up in SQL
    /// is always a plain identifier.
    pub fn with_policy(config: Config, policy: FetchPolicy) -> Result<Self, EtlError> {
        validate(&config)?;
        let client = build_http_client(&config.user_agent, &config.fetch)?;
        Ok(Self {
            config,
            client,
            policy,
        })
    }

    /// Runs extract, transform and load into the sink selected by `mode`
    pub async fn run(&self, mode: LoadMode) -> Result<PipelineReport, EtlError> {
        let raw = self.extract().await?;
        let clean = transform(raw)?;

        let mut sink = open_sink(&self.config, mode);
        load(clean, sink.as_mut())
    }

    /// Scrapes every configured category
    pub async fn extract(&self) -> Result<Vec<RawBatch>, EtlError> {
        let mut batches = Vec::with_capacity(self.config.catalog.categories.len());

        for category in &self.config.catalog.categories {
            batches.push(self.extract_category(category).await?);
        }

        Ok(batches)
    }

    /// Scrapes one category: listing pages first, then each item
    pub async fn extract_category(&self, category: &CategoryEntry) -> Result<RawBatch, EtlError> {
        let listing_url = self.config.catalog.category_url(category)?;
        tracing::info!("Fetching {} titles from {}", category.label, listing_url);

        let links = self.fetch_item_links(&listing_url).await?;
        tracing::info!("Found {} {} titles", links.len(), category.label);

        let mut records = Vec::with_capacity(links.len());
        for link in &links {
            if let Some(record) = self.fetch_item_record(link).await? {
                records.push(record);
            }
        }

        Ok(RawBatch {
            label: category.label.clone(),
            links_found: links.len(),
            records,
        })
    }

    /// Collects item detail links from a listing and its follow-on pages
    ///
    /// A listing page that does not answer 200 ends the walk with a warning; the
    /// links gathered so far are kept.
    pub async fn fetch_item_links(&self, listing_url: &Url) -> Result<Vec<String>, EtlError> {
        let catalog_base = self.config.catalog.base()?;
        let max_pages = self.config.catalog.max_listing_pages.max(1);
        let mut links = Vec::new();
        let mut page_url = listing_url.clone();

        for page in 1..=max_pages {
            let result = fetch_with_retry(&self.client, page_url.as_str(), &self.policy).await?;
            let Some(html) = result.ok_body() else {
                warn_bad_fetch(&result, page_url.as_str(), "Cannot fetch links");
                break;
            };

            links.extend(extract_item_links(html, &catalog_base));

            if !self.config.catalog.follow_pagination {
                break;
            }

            // Relative pager links resolve against the page actually served
            let served_url = result
                .final_url()
                .and_then(|u| Url::parse(u).ok())
                .unwrap_or_else(|| page_url.clone());

            match next_page_url(html, &served_url) {
                Some(next) if page < max_pages => {
                    tracing::debug!("Following listing page {}", next);
                    page_url = next;
                }
                Some(next) => {
                    tracing::warn!(
                        "Stopping at {} listing pages; {} not fetched",
                        max_pages,
                        next
                    );
                    break;
                }
                None => break,
            }
        }

        Ok(links)
    }

    /// Fetches and parses one item detail page
    ///
    /// Returns `None` (and logs a warning) when the page does not answer 200.
    pub async fn fetch_item_record(&self, url: &str) -> Result<Option<RawRecord>, EtlError> {
        let result = fetch_with_retry(&self.client, url, &self.policy).await?;

        match result.ok_body() {
            Some(html) => {
                tracing::debug!("Parsed {}", url);
                Ok(Some(extract_raw_record(html, url)))
            }
            None => {
                warn_bad_fetch(&result, url, "Cannot fetch data");
                Ok(None)
            }
        }
    }
}

fn warn_bad_fetch(result: &FetchResult, url: &str, what: &str) {
    match result {
        FetchResult::Response { status_code, .. } => {
            tracing::warn!("Bad status code {} for {}. {}.", status_code, url, what)
        }
        FetchResult::Exhausted {
            attempts,
            last_error,
        } => tracing::warn!(
            "No response from {} after {} attempts ({}). {}.",
            url,
            attempts,
            last_error,
            what
        ),
    }
}

/// Cleans every raw batch; the first bad record aborts the run
pub fn transform(batches: Vec<RawBatch>) -> Result<Vec<CleanBatch>, EtlError> {
    batches
        .into_iter()
        .map(|batch| -> Result<CleanBatch, EtlError> {
            let records = clean_batch(batch.records, &batch.label)?;
            Ok(CleanBatch {
                label: batch.label,
                links_found: batch.links_found,
                records,
            })
        })
        .collect()
}

/// Loads each batch into `sink`, one load call per batch
pub fn load(
    batches: Vec<CleanBatch>,
    sink: &mut dyn RecordSink,
) -> Result<PipelineReport, EtlError> {
    let mut report = PipelineReport::default();

    for batch in batches {
        tracing::info!(
            "Loading {} {} records into {}",
            batch.records.len(),
            batch.label,
            sink.describe()
        );
        let records_loaded = sink.load(&batch.records)?;

        report.categories.push(CategoryReport {
            label: batch.label,
            links_found: batch.links_found,
            records_loaded,
        });
    }

    Ok(report)
}

/// Runs a complete pipeline with the fetch policy from `config`
pub async fn run_pipeline(config: Config, mode: LoadMode) -> Result<PipelineReport, EtlError> {
    Pipeline::new(config)?.run(mode).await
}
