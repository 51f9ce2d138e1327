//! Crawler module for catalog fetching and extraction
//!
//! This module contains the extract side of the pipeline, including:
//! - HTTP fetching with retry logic
//! - Listing and detail page parsing
//! - The sequential driver that ties fetch, clean and load together

mod fetcher;
mod parser;
mod pipeline;

pub use fetcher::{build_http_client, fetch_with_retry, FetchPolicy, FetchResult};
pub use parser::{extract_item_links, extract_raw_record, next_page_url, title_from_url};
pub use pipeline::{
    load, run_pipeline, transform, CategoryReport, CleanBatch, Pipeline, PipelineReport,
    RawBatch,
};
