//! Scopus search API client.
//!
//! Structured alternative to scraping ScienceDirect: the Scopus search API
//! returns bibliographic metadata for a journal and year directly, given an
//! Elsevier API key.
//! API documentation: <https://dev.elsevier.com/documentation/ScopusSearchAPI.wadl>

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{Author, ListingQuery, Paper};
use crate::sources::SourceError;
use crate::utils::{FetchRequest, PageFetcher};

const SCOPUS_SEARCH_URL: &str = "https://api.elsevier.com/content/search/scopus?";

/// Keywords restricting results to experimental work
const EXPERIMENT_KEYWORDS: &str = "experiment OR experiments OR experimental OR laboratory OR \"field experiment\" OR \"field experiments\"";

/// Paging limits for the Scopus API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopusSettings {
    /// Results per request; the API allows at most 25
    pub page_size: usize,

    /// Stop after this many results
    pub max_results: usize,

    /// Pause between two requests
    #[serde(with = "crate::utils::duration_secs")]
    pub delay: Duration,
}

impl Default for ScopusSettings {
    fn default() -> Self {
        Self {
            page_size: 25,
            max_results: 1000,
            delay: Duration::from_secs(3),
        }
    }
}

/// One Scopus search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopusRecord {
    /// Bibliographic data; `primary_author` holds the first author with all listed affiliations
    pub paper: Paper,

    pub affiliations: Vec<String>,

    pub cited_by_count: Option<u32>,
}

/// Scopus search API client
#[derive(Debug, Clone)]
pub struct ScopusClient {
    api_key: String,
    settings: ScopusSettings,
}

impl ScopusClient {
    /// Create a client; the API key must not be empty
    pub fn new(api_key: impl Into<String>, settings: ScopusSettings) -> Result<Self, SourceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "an Elsevier API key is required for Scopus (set ELSEVIER_API_KEY)".to_string(),
            ));
        }
        if settings.page_size == 0 {
            return Err(SourceError::InvalidRequest(
                "Scopus page size must be positive".to_string(),
            ));
        }
        Ok(Self { api_key, settings })
    }

    /// Search query for experimental articles of a journal in a year
    pub fn query(journal: &str, year: i32) -> String {
        format!(
            "TITLE-ABS-KEY({}) AND PUBYEAR = {} AND SRCTITLE(\"{}\")",
            EXPERIMENT_KEYWORDS, year, journal
        )
    }

    fn request(&self, journal: &str, year: i32, start: usize) -> FetchRequest {
        let query = ListingQuery::new(year, self.settings.page_size)
            .param("query", Self::query(journal, year))
            .param("count", self.settings.page_size)
            .param("start", start);
        FetchRequest::new(query.url(SCOPUS_SEARCH_URL))
            .header("X-ELS-APIKey", &self.api_key)
            .header("Accept", "application/json")
    }

    /// Fetch metadata of every matching article.
    ///
    /// Paging stops at the first non-200 response, an empty page, or
    /// `max_results`. Malformed JSON is an error.
    pub async fn fetch_metadata(
        &self,
        fetcher: &dyn PageFetcher,
        journal: &str,
        year: i32,
    ) -> Result<Vec<ScopusRecord>, SourceError> {
        let mut records = Vec::new();
        let mut start = 0;

        while start < self.settings.max_results {
            tracing::info!(
                "Requesting Scopus results {} to {}",
                start + 1,
                start + self.settings.page_size
            );

            let response = match fetcher.fetch(&self.request(journal, year, start)).await {
                Ok(response) if response.status == 200 => response,
                Ok(response) => {
                    tracing::warn!("Scopus request failed with status {}", response.status);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Scopus request failed: {}", e);
                    break;
                }
            };

            let page: ScopusResponse = response.json()?;
            let entries = page.search_results.entry;
            if entries.iter().all(|e| e.error.is_some()) {
                tracing::info!("No more Scopus entries found");
                break;
            }

            records.extend(
                entries
                    .into_iter()
                    .filter(|e| e.error.is_none())
                    .map(ScopusEntry::into_record),
            );
            start += self.settings.page_size;

            if start < self.settings.max_results && !self.settings.delay.is_zero() {
                tokio::time::sleep(self.settings.delay).await;
            }
        }

        tracing::info!("Retrieved {} Scopus records", records.len());
        Ok(records)
    }
}

/// Scopus search API response
#[derive(Debug, Deserialize)]
struct ScopusResponse {
    #[serde(rename = "search-results", default)]
    search_results: ScopusResults,
}

#[derive(Debug, Default, Deserialize)]
struct ScopusResults {
    #[serde(default)]
    entry: Vec<ScopusEntry>,
}

/// An entry; empty result sets come back as a single entry with an `error` field
#[derive(Debug, Deserialize)]
struct ScopusEntry {
    error: Option<String>,
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "dc:description")]
    description: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<String>,
    #[serde(rename = "prism:volume")]
    volume: Option<String>,
    #[serde(rename = "prism:issueIdentifier")]
    issue: Option<String>,
    #[serde(rename = "prism:pageRange")]
    page_range: Option<String>,
    #[serde(rename = "citedby-count")]
    cited_by_count: Option<String>,
    #[serde(default)]
    affiliation: Vec<ScopusAffiliation>,
}

#[derive(Debug, Deserialize)]
struct ScopusAffiliation {
    affilname: Option<String>,
}

impl ScopusEntry {
    fn into_record(self) -> ScopusRecord {
        let mut paper = Paper::new(self.doi.unwrap_or_default());
        Paper::fill(&mut paper.title, self.title.as_deref().unwrap_or_default());
        Paper::fill(&mut paper.r#abstract, self.description.as_deref().unwrap_or_default());
        Paper::fill(&mut paper.volume, self.volume.as_deref().unwrap_or_default());
        Paper::fill(&mut paper.issue, self.issue.as_deref().unwrap_or_default());
        paper.set_date(self.cover_date.as_deref().unwrap_or_default());

        if let Some((start, end)) = self.page_range.as_deref().and_then(|r| r.split_once('-')) {
            Paper::fill(&mut paper.start_page, start);
            Paper::fill(&mut paper.end_page, end);
        }

        let affiliations: Vec<String> = self
            .affiliation
            .into_iter()
            .filter_map(|a| a.affilname)
            .filter(|a| !a.is_empty())
            .collect();

        paper.primary_author = self.creator.filter(|c| !c.is_empty()).map(|creator| Author {
            name: creator,
            affiliations: affiliations.clone(),
            ..Default::default()
        });

        ScopusRecord {
            paper,
            affiliations,
            cited_by_count: self.cited_by_count.and_then(|c| c.parse().ok()),
        }
    }
}
