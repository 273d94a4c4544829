//! Springer Link search provider.
//!
//! Scrapes the Springer Link search result pages. The journal identifiers
//! (print and electronic ISSN) are OR-ed into the free-text query and the
//! exclusions are negated in the same query.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::models::{ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{is_excluded_title, parse_count, ListingPage, SearchProvider, SourceError};
use crate::utils::html::{first_text, select_all, select_first, text_of};
use crate::utils::FetchRequest;

const SEARCH_URL: &str = "https://link.springer.com/search/page/";
const BASE_URL: &str = "https://link.springer.com";
const PAGE_SIZE: usize = 20;

const DEFAULT_EXCLUSIONS: &[&str] = &["Erratum"];

/// Springer Link listing search
#[derive(Debug, Clone)]
pub struct SpringerSearch {
    settings: SearchSettings,
}

impl SpringerSearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn exclusions(&self) -> Vec<String> {
        match &self.settings.exclusions {
            Some(exclusions) => exclusions.clone(),
            None => DEFAULT_EXCLUSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn query_text(&self) -> String {
        let mut text = format!("({})", self.settings.identifiers.join(" OR "));
        let exclusions = self.exclusions();
        if !exclusions.is_empty() {
            text.push_str(&format!(" AND NOT({})", exclusions.join(" ")));
        }
        text
    }

    fn parse_result(&self, result: ElementRef<'_>) -> Option<ListingEntry> {
        let link = select_first(result, "h2 a")?;
        let title = text_of(link);
        if title.is_empty() || is_excluded_title(&title) {
            return None;
        }

        let href = link.value().attr("href")?;
        let doi = href.replace("/article/", "");
        let enumeration = select_first(result, "p.meta span.enumeration");
        let journal = enumeration
            .and_then(|e| first_text(e, "a"))
            .unwrap_or_default();
        let year = enumeration
            .and_then(|e| first_text(e, "span"))
            .map(|y| enumeration_year(&y))
            .unwrap_or(0);

        Some(ListingEntry {
            publisher: Publisher::Springer,
            journal,
            journal_shortname: self.settings.journal_shortname.clone(),
            fulltext_url: Some(format!("{}/content/pdf/{}.pdf", BASE_URL, doi)),
            doi: Some(doi),
            title,
            year,
            preview_url: format!("{}{}", BASE_URL, href),
        })
    }
}

/// Year printed after the journal name, e.g. "(2020)"; 0 when it is not a year
fn enumeration_year(text: &str) -> i32 {
    text.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .parse()
        .ok()
        .filter(|year| (1000..=9999).contains(year))
        .unwrap_or(0)
}

#[async_trait]
impl SearchProvider for SpringerSearch {
    fn publisher(&self) -> Publisher {
        Publisher::Springer
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        let text = self.query_text();
        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("date-facet-mode", "between")
                    .param("facet-start-year", year)
                    .param("facet-end-year", year)
                    .param("showAll", "true")
                    .param("sortOrder", "newestFirst")
                    .param("facet-content-type", "Article")
                    .param("query", &text)
            })
            .collect()
    }

    fn page_request(&self, query: &ListingQuery, page: usize) -> FetchRequest {
        FetchRequest::new(format!("{}{}?{}", SEARCH_URL, page, query.query_string()))
    }

    fn parse_page(&self, body: &[u8], page: usize) -> Result<ListingPage, SourceError> {
        let html = Html::parse_document(&String::from_utf8_lossy(body));
        let root = html.root_element();

        let page_count = if page == 1 {
            first_text(root, "span.number-of-pages").and_then(|n| parse_count(&n))
        } else {
            None
        };

        let list = select_first(root, "ol#results-list")
            .ok_or_else(|| SourceError::Parse("Springer result list not found".to_string()))?;

        Ok(ListingPage {
            page_count,
            entries: select_all(list, "li")
                .into_iter()
                .filter_map(|result| self.parse_result(result))
                .collect(),
        })
    }
}
