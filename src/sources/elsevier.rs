//! Elsevier (ScienceDirect) search provider.
//!
//! ScienceDirect's search page is backed by a JSON endpoint that accepts the
//! journal's document id and pages by result offset.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{leading_year, ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{is_excluded_title, ListingPage, SearchProvider, SourceError};
use crate::utils::{strip_html, FetchRequest};

const SEARCH_URL: &str = "https://www.sciencedirect.com/search/api?";
const BASE_URL: &str = "https://www.sciencedirect.com";
const PAGE_SIZE: usize = 100;

/// Review and full-length articles
const DEFAULT_ARTICLE_TYPES: &[&str] = &["REV", "FLA"];

/// ScienceDirect listing search
#[derive(Debug, Clone)]
pub struct ElsevierSearch {
    settings: SearchSettings,
}

impl ElsevierSearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn article_types(&self) -> String {
        match &self.settings.article_types {
            Some(types) => types.join(","),
            None => DEFAULT_ARTICLE_TYPES.join(","),
        }
    }

    fn to_entry(&self, article: ElsevierArticle) -> Option<ListingEntry> {
        let title = strip_html(&article.title);
        if title.is_empty() || is_excluded_title(&title) {
            return None;
        }

        Some(ListingEntry {
            publisher: Publisher::Elsevier,
            journal: article.source_title,
            journal_shortname: self.settings.journal_shortname.clone(),
            doi: article.doi.filter(|d| !d.is_empty()),
            title,
            year: leading_year(&article.publication_date),
            preview_url: format!("{}{}", BASE_URL, article.link),
            fulltext_url: article
                .pdf
                .and_then(|pdf| pdf.download_link)
                .map(|link| format!("{}{}", BASE_URL, link)),
        })
    }
}

#[async_trait]
impl SearchProvider for ElsevierSearch {
    fn publisher(&self) -> Publisher {
        Publisher::Elsevier
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("show", PAGE_SIZE)
                    .param("sortBy", "date")
                    .param("articleTypes", self.article_types())
                    .param("offset", 0)
                    .param("docId", self.settings.primary_identifier())
                    .param("date", year)
            })
            .collect()
    }

    fn page_request(&self, query: &ListingQuery, page: usize) -> FetchRequest {
        let mut query = query.clone();
        query.set("offset", (page - 1) * query.page_size);
        FetchRequest::new(query.url(SEARCH_URL)).header("Accept", "application/json")
    }

    fn parse_page(&self, body: &[u8], _page: usize) -> Result<ListingPage, SourceError> {
        let response: ElsevierSearchResponse = serde_json::from_slice(body).map_err(|e| {
            SourceError::Parse(format!(
                "ScienceDirect did not return JSON (institutional login required?): {}",
                e
            ))
        })?;

        Ok(ListingPage {
            page_count: Some(response.results_found.div_ceil(PAGE_SIZE)),
            entries: response
                .search_results
                .into_iter()
                .filter_map(|article| self.to_entry(article))
                .collect(),
        })
    }
}

/// ScienceDirect search API response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElsevierSearchResponse {
    #[serde(default)]
    results_found: usize,
    #[serde(default)]
    search_results: Vec<ElsevierArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElsevierArticle {
    #[serde(default)]
    source_title: String,
    doi: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    publication_date: String,
    #[serde(default)]
    link: String,
    pdf: Option<ElsevierPdf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElsevierPdf {
    download_link: Option<String>,
}
