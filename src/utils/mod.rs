//! Utility modules supporting the harvesting pipeline.
//!
//! - [`PageFetcher`]: capability to fetch a URL, implemented by [`HttpClient`]
//! - [`HttpClient`]: reqwest client with a rotating browser user agent
//! - [`RetryConfig`] / [`with_retry`]: fixed-delay retries for downloads
//! - [`extract_text`]: extract text content from PDF files
//! - [`strip_html`]: plain text of an HTML fragment
//! - [`html`]: selector helpers over `scraper`
//!
//! # Retry with a fixed delay
//!
//! ```rust,no_run
//! use journal_harvester::utils::{with_retry, RetryConfig};
//! use std::time::Duration;
//!
//! # async fn fetch_data() -> Result<String, String> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() {
//! let config = RetryConfig::new(3, Duration::from_secs(1));
//! let result = with_retry(config, |_attempt| fetch_data()).await;
//! println!("took {} attempts", result.attempts());
//! # }
//! ```

pub mod html;
mod http;
mod pdf;
mod retry;

pub use http::{FetchRequest, FetchResponse, HttpClient, PageFetcher, UserAgentPool};
pub use pdf::{extract_text, extract_text_if_present, PdfExtractError};
pub use retry::{with_retry, RetryConfig, RetryResult};

use scraper::Html;

/// Plain text of an HTML fragment: tags removed, entities decoded, whitespace collapsed
pub fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    collapse_whitespace(&parsed.root_element().text().collect::<String>())
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Serialize a `Duration` as (fractional) seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("An <i>oTree</i>-based architecture &amp; more"),
            "An oTree-based architecture & more"
        );
        assert_eq!(strip_html("  plain\n  text "), "plain text");
    }
}
