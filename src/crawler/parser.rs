//! HTML parser for catalog pages
//!
//! This module handles parsing the two page kinds the catalog serves:
//! - Category listings: item detail links and the "next" pagination link
//! - Item detail pages: the product attribute table and description

use crate::record::{ProductField, RawRecord};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts the absolute detail URLs of every item on a category listing
///
/// Item links are the only elements on a listing that carry a non-empty `title`
/// attribute. Their hrefs are relative to the listing (`../../../slug_123/index.html`);
/// everything up to the last `../` is dropped and the remainder joined onto the
/// catalog base. Order follows the document, duplicates included.
///
/// # Example
///
/// ```
/// use bookshelf_etl::crawler::extract_item_links;
/// use url::Url;
///
/// let html = r#"<a href="../../../sapiens_996/index.html" title="Sapiens">Sapiens</a>"#;
/// let base = Url::parse("http://books.toscrape.com/catalogue/").unwrap();
/// let links = extract_item_links(html, &base);
/// assert_eq!(links, vec!["http://books.toscrape.com/catalogue/sapiens_996/index.html"]);
/// ```
pub fn extract_item_links(html: &str, catalog_base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let Ok(selector) = Selector::parse("[title][href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let has_title = element
            .value()
            .attr("title")
            .is_some_and(|t| !t.trim().is_empty());
        if !has_title {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            links.push(rebase_item_href(href, catalog_base));
        }
    }

    links
}

/// Rewrites a listing-relative item href onto the catalog base
fn rebase_item_href(href: &str, catalog_base: &Url) -> String {
    let page = href.trim().rsplit("../").next().unwrap_or_default();
    let base = catalog_base.as_str();

    if base.ends_with('/') {
        format!("{}{}", base, page.trim_start_matches('/'))
    } else {
        format!("{}/{}", base, page.trim_start_matches('/'))
    }
}

/// Returns the absolute URL of the next listing page, if any
pub fn next_page_url(html: &str, current: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("li.next > a[href]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| current.join(href.trim()).ok())
}

/// Derives an item title from its detail URL
///
/// The second-to-last path segment is the item slug followed by `_<id>`
/// (`.../a-light-in-the-attic_1000/index.html` gives `a-light-in-the-attic`).
pub fn title_from_url(url: &str) -> String {
    let segments: Vec<String> = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .map(|s| s.map(str::to_string).collect())
            .unwrap_or_default(),
        Err(_) => url.split('/').map(str::to_string).collect(),
    };

    let slug = if segments.len() >= 2 {
        segments[segments.len() - 2].as_str()
    } else {
        segments.last().map(String::as_str).unwrap_or_default()
    };

    slug.split('_').next().unwrap_or_default().to_string()
}

/// Parses an item detail page into a raw record
///
/// Table values are keyed by each row's label cell. Markup without label cells falls
/// back to zipping every `td` in document order against [`ProductField::ALL`]. Fields
/// the page does not provide stay empty.
pub fn extract_raw_record(html: &str, url: &str) -> RawRecord {
    let document = Html::parse_document(html);
    let mut record = RawRecord::with_title(title_from_url(url));

    if !extract_labeled_rows(&document, &mut record) {
        extract_positional_cells(&document, &mut record);
    }

    record.product_description = extract_description(&document).unwrap_or_else(|| {
        tracing::debug!("No product description found for {}", url);
        String::new()
    });

    record
}

/// Fills fields from `<tr><th>Label</th><td>Value</td></tr>` rows
///
/// Returns false if no row carried a known label.
fn extract_labeled_rows(document: &Html, record: &mut RawRecord) -> bool {
    let (Ok(row_sel), Ok(th_sel), Ok(td_sel)) = (
        Selector::parse("table tr"),
        Selector::parse("th"),
        Selector::parse("td"),
    ) else {
        return false;
    };

    let mut matched = false;

    for row in document.select(&row_sel) {
        let label = row.select(&th_sel).next().map(element_text);
        let value = row.select(&td_sel).next().map(element_text);

        if let (Some(label), Some(value)) = (label, value) {
            if let Some(field) = ProductField::from_label(&label) {
                record.set(field, value);
                matched = true;
            }
        }
    }

    matched
}

/// Zips all `td` cells in document order against the fixed field list
fn extract_positional_cells(document: &Html, record: &mut RawRecord) {
    let Ok(td_sel) = Selector::parse("td") else {
        return;
    };

    for (field, cell) in ProductField::ALL.into_iter().zip(document.select(&td_sel)) {
        record.set(field, element_text(cell));
    }
}

/// Reads the text of the first element following the description marker
fn extract_description(document: &Html) -> Option<String> {
    let marker_sel = Selector::parse("#product_description").ok()?;
    let marker = document.select(&marker_sel).next()?;

    marker
        .next_siblings()
        .find_map(ElementRef::wrap)
        .map(element_text)
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
