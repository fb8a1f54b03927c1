//! Search and relay URL construction

use url::Url;

/// Relay (proxy) endpoint parameters for one fetch role
///
/// The relay wraps every outgoing request: the real target travels as a
/// query parameter of the relay endpoint, together with the account key,
/// a location hint, and an optional render wait.
#[derive(Debug, Clone)]
pub struct RelayTarget {
    /// Relay endpoint, e.g. `https://proxy.scrapeops.io/v1/`
    pub endpoint: String,

    /// Account API key
    pub api_key: String,

    /// Country/location hint for the relay
    pub location: String,

    /// Optional wait passed to the relay so rendered pages settle
    pub wait: Option<u64>,
}

/// Builds the search-result page URL for a keyword
///
/// Spaces in the keyword become `+`, matching the search engine's query
/// format.
pub fn search_url(keyword: &str) -> String {
    let formatted = keyword.trim().replace(' ', "+");
    format!("https://duckduckgo.com/?q={}&t=h_&ia=web", formatted)
}

/// Wraps a target URL in the relay envelope
///
/// # Arguments
///
/// * `relay` - The relay parameters to use
/// * `target` - The real URL to fetch through the relay
///
/// # Returns
///
/// * `Ok(String)` - The full relay request URL
/// * `Err(url::ParseError)` - The configured endpoint is not a valid URL
pub fn relay_url(relay: &RelayTarget, target: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&relay.endpoint)?;

    url.query_pairs_mut()
        .append_pair("api_key", &relay.api_key)
        .append_pair("url", target)
        .append_pair("country", &relay.location);

    if let Some(wait) = relay.wait {
        url.query_pairs_mut().append_pair("wait", &wait.to_string());
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_relay(wait: Option<u64>) -> RelayTarget {
        RelayTarget {
            endpoint: "https://relay.example/v1/".to_string(),
            api_key: "secret".to_string(),
            location: "us".to_string(),
            wait,
        }
    }

    #[test]
    fn test_search_url_replaces_spaces() {
        assert_eq!(
            search_url("learn rust"),
            "https://duckduckgo.com/?q=learn+rust&t=h_&ia=web"
        );
    }

    #[test]
    fn test_search_url_trims_keyword() {
        assert_eq!(
            search_url("  learn rust  "),
            "https://duckduckgo.com/?q=learn+rust&t=h_&ia=web"
        );
    }

    #[test]
    fn test_relay_url_carries_target_and_key() {
        let url = relay_url(&test_relay(None), "https://example.com/page").unwrap();
        let parsed = Url::parse(&url).unwrap();

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(pairs.contains(&("api_key".to_string(), "secret".to_string())));
        assert!(pairs.contains(&("url".to_string(), "https://example.com/page".to_string())));
        assert!(pairs.contains(&("country".to_string(), "us".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "wait"));
    }

    #[test]
    fn test_relay_url_includes_wait_when_set() {
        let url = relay_url(&test_relay(Some(5000)), "https://example.com").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let wait = parsed
            .query_pairs()
            .find(|(k, _)| k == "wait")
            .map(|(_, v)| v.to_string());
        assert_eq!(wait.as_deref(), Some("5000"));
    }

    #[test]
    fn test_relay_url_rejects_bad_endpoint() {
        let mut relay = test_relay(None);
        relay.endpoint = "not a url".to_string();
        assert!(relay_url(&relay, "https://example.com").is_err());
    }
}
