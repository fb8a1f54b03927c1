//! Record types for extracted data
//!
//! A record is an immutable, field-normalized unit of extracted data:
//! either a search result or the metadata of a fetched page. Normalization
//! happens exactly once, in the constructor — string fields are trimmed and
//! empty values are replaced with a `"No <field>"` sentinel — so a record
//! that exists is always well-formed.

use serde::{Deserialize, Serialize};

/// A single search result extracted from a result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Display name of the result (the heading text)
    pub name: String,

    /// Scheme and host of the result URL
    pub base_url: String,

    /// Full URL of the result
    pub url: String,

    /// Position of the result on its page (0-based)
    pub rank: u32,
}

impl SearchResult {
    /// CSV column order; matches field declaration order
    pub const FIELDS: [&'static str; 4] = ["name", "base_url", "url", "rank"];

    /// Creates a normalized search result
    ///
    /// String fields are trimmed; empty values become `"No <field>"`.
    pub fn new(name: &str, base_url: &str, url: &str, rank: u32) -> Self {
        Self {
            name: normalize_field(name, "name"),
            base_url: normalize_field(base_url, "base_url"),
            url: normalize_field(url, "url"),
            rank,
        }
    }
}

/// Metadata extracted from a fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Page title
    pub name: String,

    /// URL the page was fetched from
    pub url: String,

    /// Meta description, or `"n/a"` when the page has none
    pub description: String,
}

impl PageMetadata {
    /// CSV column order; matches field declaration order
    pub const FIELDS: [&'static str; 3] = ["name", "url", "description"];

    /// Creates a normalized page metadata record
    pub fn new(name: &str, url: &str, description: &str) -> Self {
        Self {
            name: normalize_field(name, "name"),
            url: normalize_field(url, "url"),
            description: normalize_field(description, "description"),
        }
    }
}

/// A unit of extracted data flowing through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Search(SearchResult),
    Page(PageMetadata),
}

impl Record {
    /// The key used for duplicate suppression: the normalized `name` field.
    ///
    /// Two records with the same name are considered the same item even if
    /// their URLs differ; the second is dropped.
    pub fn dedup_key(&self) -> &str {
        match self {
            Record::Search(r) => &r.name,
            Record::Page(r) => &r.name,
        }
    }

    /// Column names for CSV output, in field declaration order
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Record::Search(_) => &SearchResult::FIELDS,
            Record::Page(_) => &PageMetadata::FIELDS,
        }
    }

    /// Converts the record to a JSON object with its fields as keys
    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Record::Search(r) => serde_json::to_value(r),
            Record::Page(r) => serde_json::to_value(r),
        }
    }
}

impl From<SearchResult> for Record {
    fn from(value: SearchResult) -> Self {
        Record::Search(value)
    }
}

impl From<PageMetadata> for Record {
    fn from(value: PageMetadata) -> Self {
        Record::Page(value)
    }
}

/// Trims a string field, substituting a sentinel when the result is empty
fn normalize_field(value: &str, field: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        format!("No {}", field)
    } else {
        trimmed.to_string()
    }
}
