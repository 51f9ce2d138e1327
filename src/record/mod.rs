//! Record types flowing through the pipeline
//!
//! A [`RawRecord`] holds the text scraped from one item detail page. Cleaning turns it
//! into a [`CleanRecord`] with typed numeric columns and a category label, which is the
//! row shape every output sink writes.

mod clean;

pub use clean::{clean_batch, clean_record, extract_decimal, extract_integer, CleanError};

/// Column names of the output schema, in order
pub const COLUMNS: [&str; 10] = [
    "title",
    "upc",
    "product_type",
    "price_excl_tax",
    "price_incl_tax",
    "tax",
    "availability",
    "number_of_reviews",
    "product_description",
    "category",
];

/// Text fields scraped from one item detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Derived from the detail URL, not from page content
    pub title: String,
    pub upc: String,
    pub product_type: String,
    pub price_excl_tax: String,
    pub price_incl_tax: String,
    pub tax: String,
    pub availability: String,
    pub number_of_reviews: String,
    pub product_description: String,
}

/// Attribute table fields, in the order the catalog renders them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
    Upc,
    ProductType,
    PriceExclTax,
    PriceInclTax,
    Tax,
    Availability,
    NumberOfReviews,
}

impl ProductField {
    /// All table fields in rendering order
    pub const ALL: [ProductField; 7] = [
        Self::Upc,
        Self::ProductType,
        Self::PriceExclTax,
        Self::PriceInclTax,
        Self::Tax,
        Self::Availability,
        Self::NumberOfReviews,
    ];

    /// Returns the row label the catalog uses for this field
    pub fn label(&self) -> &'static str {
        match self {
            Self::Upc => "UPC",
            Self::ProductType => "Product Type",
            Self::PriceExclTax => "Price (excl. tax)",
            Self::PriceInclTax => "Price (incl. tax)",
            Self::Tax => "Tax",
            Self::Availability => "Availability",
            Self::NumberOfReviews => "Number of reviews",
        }
    }

    /// Looks up a field by its row label (whitespace-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|f| f.label() == label)
    }
}

impl RawRecord {
    /// Creates an empty record carrying only a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Stores a scraped table value under its field
    pub fn set(&mut self, field: ProductField, value: String) {
        let slot = match field {
            ProductField::Upc => &mut self.upc,
            ProductField::ProductType => &mut self.product_type,
            ProductField::PriceExclTax => &mut self.price_excl_tax,
            ProductField::PriceInclTax => &mut self.price_incl_tax,
            ProductField::Tax => &mut self.tax,
            ProductField::Availability => &mut self.availability,
            ProductField::NumberOfReviews => &mut self.number_of_reviews,
        };
        *slot = value;
    }
}

/// A typed, category-stamped row ready to be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub title: String,
    pub upc: String,
    pub product_type: String,
    pub price_excl_tax: f64,
    pub price_incl_tax: f64,
    pub tax: f64,
    pub availability: i64,
    pub number_of_reviews: i64,
    pub product_description: String,
    pub category: String,
}

impl CleanRecord {
    /// Renders the record as text cells in [`COLUMNS`] order
    ///
    /// Floats use the shortest representation that keeps a decimal point, so `0.0`
    /// stays `0.0` rather than collapsing to `0`.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.upc.clone(),
            self.product_type.clone(),
            format!("{:?}", self.price_excl_tax),
            format!("{:?}", self.price_incl_tax),
            format!("{:?}", self.tax),
            self.availability.to_string(),
            self.number_of_reviews.to_string(),
            self.product_description.clone(),
            self.category.clone(),
        ]
    }
}
