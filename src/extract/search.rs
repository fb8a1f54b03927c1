//! Search-result extraction
//!
//! Result pages list hits as `<h2>` headings wrapping an anchor. Each
//! heading with a link becomes one record: the heading text is the name,
//! the anchor href is the URL, and the rank is the record's position
//! among extracted results on the page. Headings without a link are
//! skipped without consuming a rank.

use crate::extract::{ExtractError, ExtractResult, Extractor};
use crate::record::{Record, SearchResult};
use scraper::{Html, Selector};
use url::Url;

/// Extractor for search-result pages
#[derive(Debug, Default)]
pub struct SearchResultExtractor;

impl Extractor for SearchResultExtractor {
    fn extract(&self, body: &str, _target: &str) -> ExtractResult<Vec<Record>> {
        let document = Html::parse_document(body);

        let heading_selector =
            Selector::parse("h2").map_err(|e| ExtractError::Selector(e.to_string()))?;
        let link_selector =
            Selector::parse("a[href]").map_err(|e| ExtractError::Selector(e.to_string()))?;

        let mut records = Vec::new();
        let mut rank = 0u32;

        for heading in document.select(&heading_selector) {
            let Some(link) = heading.select(&link_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            let name: String = heading.text().collect();
            records.push(SearchResult::new(&name, &base_of(href), href, rank).into());
            rank += 1;
        }

        Ok(records)
    }
}

/// Scheme and host of a URL, or empty when it cannot be determined
fn base_of(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{}", url.scheme(), host),
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <h2><a href="https://site-a.example/rust">Rust Book</a></h2>
        <h2>Heading without a link</h2>
        <h2><a href="https://site-b.example/learn?x=1">Learning Rust</a></h2>
        </body></html>
    "#;

    fn extract(body: &str) -> Vec<SearchResult> {
        SearchResultExtractor
            .extract(body, "https://search.example/?q=rust")
            .unwrap()
            .into_iter()
            .map(|record| match record {
                Record::Search(r) => r,
                other => panic!("unexpected record {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_extracts_linked_headings_only() {
        let results = extract(PAGE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Rust Book");
        assert_eq!(results[1].name, "Learning Rust");
    }

    #[test]
    fn test_ranks_follow_extraction_order() {
        let results = extract(PAGE);
        assert_eq!(results[0].rank, 0);
        assert_eq!(results[1].rank, 1);
    }

    #[test]
    fn test_base_url_is_scheme_and_host() {
        let results = extract(PAGE);
        assert_eq!(results[0].base_url, "https://site-a.example");
        assert_eq!(results[1].base_url, "https://site-b.example");
        assert_eq!(results[1].url, "https://site-b.example/learn?x=1");
    }

    #[test]
    fn test_unparseable_href_gets_sentinel_base() {
        let page = r#"<h2><a href="/relative/path">Relative</a></h2>"#;
        let results = extract(page);
        assert_eq!(results.len(), 1);
        // Normalization turns the empty base into the sentinel
        assert_eq!(results[0].base_url, "No base_url");
    }

    #[test]
    fn test_empty_page_yields_no_records() {
        let results = extract("<html><body><p>nothing here</p></body></html>");
        assert!(results.is_empty());
    }
}
