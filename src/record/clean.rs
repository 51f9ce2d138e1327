//! Numeric coercion of scraped text
//!
//! Prices, tax, stock and review counts arrive as display text ("£51.77",
//! "In stock (19 available)"). The first number in each field is kept; a field without
//! one is an error, never a default.

use crate::record::{CleanRecord, RawRecord};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref DECIMAL_RE: Regex = Regex::new(r"[0-9]+\.[0-9]+").unwrap();
    static ref INTEGER_RE: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// Errors raised while coercing a raw record
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("No number found in {field} of '{title}': {value:?}")]
    MissingNumber {
        title: String,
        field: &'static str,
        value: String,
    },

    #[error("Number out of range in {field} of '{title}': {value:?}")]
    OutOfRange {
        title: String,
        field: &'static str,
        value: String,
    },
}

/// Returns the first decimal number (`123.45`) in `text`
pub fn extract_decimal(text: &str) -> Option<f64> {
    DECIMAL_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Returns the first unsigned integer in `text`
///
/// `None` covers both "no digits" and "too many digits for an i64".
pub fn extract_integer(text: &str) -> Option<i64> {
    INTEGER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

fn decimal_field(raw: &RawRecord, field: &'static str, value: &str) -> Result<f64, CleanError> {
    extract_decimal(value).ok_or_else(|| CleanError::MissingNumber {
        title: raw.title.clone(),
        field,
        value: value.to_string(),
    })
}

fn integer_field(raw: &RawRecord, field: &'static str, value: &str) -> Result<i64, CleanError> {
    match INTEGER_RE.find(value) {
        None => Err(CleanError::MissingNumber {
            title: raw.title.clone(),
            field,
            value: value.to_string(),
        }),
        Some(_) => extract_integer(value).ok_or_else(|| CleanError::OutOfRange {
            title: raw.title.clone(),
            field,
            value: value.to_string(),
        }),
    }
}

/// Cleans one raw record and stamps it with `category`
pub fn clean_record(raw: RawRecord, category: &str) -> Result<CleanRecord, CleanError> {
    let price_excl_tax = decimal_field(&raw, "price_excl_tax", &raw.price_excl_tax)?;
    let price_incl_tax = decimal_field(&raw, "price_incl_tax", &raw.price_incl_tax)?;
    let tax = decimal_field(&raw, "tax", &raw.tax)?;
    let availability = integer_field(&raw, "availability", &raw.availability)?;
    let number_of_reviews = integer_field(&raw, "number_of_reviews", &raw.number_of_reviews)?;

    Ok(CleanRecord {
        title: raw.title,
        upc: raw.upc,
        product_type: raw.product_type,
        price_excl_tax,
        price_incl_tax,
        tax,
        availability,
        number_of_reviews,
        product_description: raw.product_description,
        category: category.to_string(),
    })
}

/// Cleans a whole category batch, failing on the first bad record
pub fn clean_batch(
    raws: Vec<RawRecord>,
    category: &str,
) -> Result<Vec<CleanRecord>, CleanError> {
    raws.into_iter()
        .map(|raw| clean_record(raw, category))
        .collect()
}
