//! Page metadata extraction
//!
//! Produces one record per page: title, URL, and meta description. A page
//! without a `<title>` is an extraction failure (the item is retried like
//! any other fetch failure); a missing description falls back to `"n/a"`.

use crate::extract::{ExtractError, ExtractResult, Extractor};
use crate::record::{PageMetadata, Record};
use scraper::{Html, Selector};

/// Extractor for target-page metadata
#[derive(Debug, Default)]
pub struct PageMetadataExtractor;

impl Extractor for PageMetadataExtractor {
    fn extract(&self, body: &str, target: &str) -> ExtractResult<Vec<Record>> {
        let document = Html::parse_document(body);

        let title_selector =
            Selector::parse("title").map_err(|e| ExtractError::Selector(e.to_string()))?;
        let description_selector = Selector::parse(r#"meta[name="description"]"#)
            .map_err(|e| ExtractError::Selector(e.to_string()))?;

        let title: String = document
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect())
            .ok_or_else(|| ExtractError::MissingElement {
                element: "<title>",
                url: target.to_string(),
            })?;

        let description = document
            .select(&description_selector)
            .next()
            .and_then(|element| element.value().attr("content"))
            .unwrap_or("n/a");

        Ok(vec![PageMetadata::new(&title, target, description).into()])
    }
}
