//! Publisher search providers.
//!
//! This module defines the [`SearchProvider`] trait that every publisher's
//! listing-page search implements. A provider turns [`SearchSettings`] (one
//! journal over a range of years) into one [`ListingQuery`] per year, newest
//! first, and walks the paginated listing of each query through a
//! [`PageFetcher`].
//!
//! # Pagination
//!
//! The first page of a query declares how many pages exist. The loop keeps
//! requesting pages until that count is reached. A failed fetch, a non-2xx
//! status or an unreadable page ends the query early; whatever was collected
//! so far is kept and nothing is retried at this layer.
//!
//! # Adding a publisher
//!
//! 1. Add a variant to [`Publisher`]
//! 2. Create a struct implementing `SearchProvider` (at minimum `page_request`
//!    and `parse_page`)
//! 3. Map the variant in [`search_provider`]

mod cambridge;
mod elsevier;
mod nature;
mod oxford;
mod registry;
pub mod scopus;
mod springer;
mod tandf;
mod wiley;

pub mod mock;

pub use cambridge::CambridgeSearch;
pub use elsevier::ElsevierSearch;
pub use mock::MockFetcher;
pub use nature::NatureSearch;
pub use oxford::OxfordSearch;
pub use registry::{search_provider, search_provider_for};
pub use springer::SpringerSearch;
pub use tandf::TandFSearch;
pub use wiley::WileySearch;

use async_trait::async_trait;

use crate::models::{ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::utils::{FetchRequest, PageFetcher};

/// Titles that are never research articles, whatever the publisher
const EXCLUDED_TITLE_PREFIXES: &[&str] = &["corrigendum", "erratum", "correction to", "retraction"];

/// One parsed listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Number of pages for the whole query, as declared on the page
    pub page_count: Option<usize>,

    /// Entries in listing order, already filtered
    pub entries: Vec<ListingEntry>,
}

/// The SearchProvider trait defines the listing-page search of one publisher.
#[async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Publisher searched by this provider
    fn publisher(&self) -> Publisher;

    /// Journal and year range being searched
    fn settings(&self) -> &SearchSettings;

    /// One query per year of the range, newest year first
    fn generate_queries(&self) -> Vec<ListingQuery>;

    /// Request for the given 1-based page of a query
    fn page_request(&self, query: &ListingQuery, page: usize) -> FetchRequest;

    /// Parse one listing page body.
    ///
    /// `page_count` only needs to be filled for the first page.
    fn parse_page(&self, body: &[u8], page: usize) -> Result<ListingPage, SourceError>;

    /// Walk the pages of one query and append its entries to `results`
    async fn conduct_search(
        &self,
        fetcher: &dyn PageFetcher,
        query: &ListingQuery,
        results: &mut Vec<ListingEntry>,
    ) {
        let mut page = 1;
        let mut max_page = 1;

        while page <= max_page {
            let request = self.page_request(query, page);
            tracing::debug!(url = %request.url, page, "requesting listing page");

            let response = match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => response,
                Ok(response) => {
                    tracing::warn!(
                        "{} listing for {} stopped at page {}: HTTP {}",
                        self.publisher(),
                        query.year,
                        page,
                        response.status
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "{} listing for {} stopped at page {}: {}",
                        self.publisher(),
                        query.year,
                        page,
                        e
                    );
                    break;
                }
            };

            let parsed = match self.parse_page(&response.body, page) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(
                        "{} listing for {} unreadable at page {}: {}",
                        self.publisher(),
                        query.year,
                        page,
                        e
                    );
                    break;
                }
            };

            if page == 1 {
                if let Some(count) = parsed.page_count {
                    max_page = count;
                }
            }

            tracing::debug!(page, max_page, found = parsed.entries.len(), "listing page parsed");
            results.extend(parsed.entries);
            page += 1;
        }
    }

    /// Run every generated query in order and collect all entries
    async fn search(&self, fetcher: &dyn PageFetcher) -> Vec<ListingEntry> {
        let mut results = Vec::new();
        for query in self.generate_queries() {
            tracing::info!(
                "Searching {} ({}) for {}",
                self.settings().journal_shortname,
                self.publisher(),
                query.year
            );
            let before = results.len();
            self.conduct_search(fetcher, &query, &mut results).await;
            tracing::info!("Found {} entries for {}", results.len() - before, query.year);
        }
        results
    }
}

/// Whether a listing title is a correction notice rather than an article
pub fn is_excluded_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    EXCLUDED_TITLE_PREFIXES
        .iter()
        .any(|prefix| title.starts_with(prefix))
}

/// Whether `value` equals one of the exclusions, ignoring case
pub(crate) fn matches_exclusion(value: &str, exclusions: &[String]) -> bool {
    let value = value.trim();
    exclusions.iter().any(|e| e.eq_ignore_ascii_case(value))
}

/// Parse the first run of digits in `text`, ignoring thousands separators
pub(crate) fn parse_count(text: &str) -> Option<usize> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Errors that can occur when searching a publisher or calling an API
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (JSON, HTML, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No search provider exists for this key
    #[error("Search provider does not exist: {0}")]
    UnknownPublisher(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
