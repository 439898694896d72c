//! Page-title retrieval for bookmarks.
//!
//! When a bookmark is created without a title, the target page is fetched and
//! the text of its first `<title>` element is used. Every failure along the
//! way (connect error, timeout, non-success status, unreadable body, missing
//! or empty element) resolves to the `Untitled` fallback; bookmark creation
//! never surfaces a fetch error.

use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Outcome of a title lookup. The fallback is its own variant so callers can
/// tell a scraped title from the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTitle {
    Fetched(String),
    Untitled,
}

impl PageTitle {
    pub fn into_title(self) -> String {
        match self {
            PageTitle::Fetched(t) => t,
            PageTitle::Untitled => "Untitled".to_string(),
        }
    }
}

static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static pattern"));

#[derive(Clone)]
pub struct TitleFetcher {
    client: reqwest::Client,
}

impl TitleFetcher {
    /// Build a fetcher whose requests are bounded by `timeout` end to end.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GET the page and extract its title. Never returns an error: failures
    /// are logged at debug level and collapse to the fallback.
    pub async fn resolve(&self, url: &str) -> PageTitle {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("title fetch for {} failed: {}", url, e);
                return PageTitle::Untitled;
            }
        };
        if !response.status().is_success() {
            debug!("title fetch for {} returned {}", url, response.status());
            return PageTitle::Untitled;
        }
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                debug!("title fetch for {} body error: {}", url, e);
                return PageTitle::Untitled;
            }
        };
        match extract_title(&body) {
            Some(t) => PageTitle::Fetched(t),
            None => PageTitle::Untitled,
        }
    }
}

/// Pull the text of the first `<title>` element, whitespace-collapsed and
/// with the common entities decoded. `None` when absent or empty.
fn extract_title(html: &str) -> Option<String> {
    let captures = TITLE_PATTERN.captures(html)?;
    let raw = captures.get(1)?.as_str();
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let decoded = decode_entities(&collapsed);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// The named entities that show up in real page titles. Anything rarer is
/// left as-is.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_simple_title() {
        let html = "<html><head><title>My Page</title></head><body></body></html>";
        assert_eq!(extract_title(html), Some("My Page".to_string()));
    }

    #[test]
    fn test_title_tag_may_carry_attributes_and_any_case() {
        let html = "<HEAD><TITLE lang=\"en\">Loud Page</TITLE></HEAD>";
        assert_eq!(extract_title(html), Some("Loud Page".to_string()));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let html = "<title>\n    Spread\n    Out   Title\n  </title>";
        assert_eq!(extract_title(html), Some("Spread Out Title".to_string()));
    }

    #[test]
    fn test_entities_are_decoded() {
        let html = "<title>Q&amp;A &#39;basics&#39; &lt;draft&gt;</title>";
        assert_eq!(extract_title(html), Some("Q&A 'basics' <draft>".to_string()));
    }

    #[test]
    fn test_first_title_wins() {
        let html = "<title>first</title><title>second</title>";
        assert_eq!(extract_title(html), Some("first".to_string()));
    }

    #[test]
    fn test_missing_or_blank_title_is_none() {
        assert_eq!(extract_title("<html><body>no head</body></html>"), None);
        assert_eq!(extract_title("<title></title>"), None);
        assert_eq!(extract_title("<title>   \n </title>"), None);
    }

    #[test]
    fn test_fallback_renders_as_untitled() {
        assert_eq!(PageTitle::Untitled.into_title(), "Untitled");
        assert_eq!(PageTitle::Fetched("kept".into()).into_title(), "kept");
    }
}
