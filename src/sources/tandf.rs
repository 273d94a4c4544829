//! Taylor & Francis Online search provider.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::models::{trailing_year, ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{is_excluded_title, ListingPage, SearchProvider, SourceError};
use crate::utils::html::{first_text, select_all, select_first, text_of};
use crate::utils::FetchRequest;

const SEARCH_URL: &str = "https://www.tandfonline.com/action/doSearch?";
const BASE_URL: &str = "https://www.tandfonline.com";
const PAGE_SIZE: usize = 100;

const DEFAULT_EXCLUSIONS: &[&str] = &["Correction", "Editorial"];

/// Taylor & Francis listing search, keyed by the journal's series key
#[derive(Debug, Clone)]
pub struct TandFSearch {
    settings: SearchSettings,
}

impl TandFSearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn exclusions(&self) -> Vec<String> {
        match &self.settings.exclusions {
            Some(exclusions) => exclusions.clone(),
            None => DEFAULT_EXCLUSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn parse_result(&self, result: ElementRef<'_>) -> Option<ListingEntry> {
        let link = select_first(result, "span.hlFld-Title a")?;
        let title = text_of(link);
        if is_excluded_title(&title) {
            return None;
        }
        let doi = link.value().attr("href")?.replace("/doi/full/", "");

        Some(ListingEntry {
            publisher: Publisher::TandF,
            journal: first_text(result, "a.searchResultJournal").unwrap_or_default(),
            journal_shortname: self.settings.journal_shortname.clone(),
            title,
            year: first_text(result, "span.publication-year")
                .map(|date| trailing_year(&date))
                .unwrap_or(0),
            preview_url: format!("{}/doi/full/{}", BASE_URL, doi),
            fulltext_url: Some(format!("{}/doi/pdf/{}", BASE_URL, doi)),
            doi: Some(doi),
        })
    }
}

#[async_trait]
impl SearchProvider for TandFSearch {
    fn publisher(&self) -> Publisher {
        Publisher::TandF
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        let text = format!("NOT ({})", self.exclusions().join(" OR "));
        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("field1", "AllField")
                    .param("text1", &text)
                    .param("SeriesKey", self.settings.primary_identifier())
                    .param("sortBy", "Earliest_asc")
                    .param("pageSize", PAGE_SIZE)
                    .param("startPage", 0)
                    .param("AfterYear", year)
                    .param("BeforeYear", year)
            })
            .collect()
    }

    fn page_request(&self, query: &ListingQuery, page: usize) -> FetchRequest {
        let mut query = query.clone();
        query.set("startPage", page - 1);
        FetchRequest::new(query.url(SEARCH_URL))
    }

    fn parse_page(&self, body: &[u8], page: usize) -> Result<ListingPage, SourceError> {
        let html = Html::parse_document(&String::from_utf8_lossy(body));
        let root = html.root_element();

        // The pager lists every page plus a "next" link
        let page_count = if page == 1 {
            let links = select_all(root, "li.pageLinks").len();
            (links > 0).then(|| links - 1)
        } else {
            None
        };

        let list = select_first(root, "ol.search-results")
            .ok_or_else(|| SourceError::Parse("T&F result list not found".to_string()))?;

        Ok(ListingPage {
            page_count,
            entries: select_all(list, "li.search-article-tools")
                .into_iter()
                .filter_map(|result| self.parse_result(result))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TandFSearch {
        TandFSearch::new(SearchSettings::new("tcpo20", vec!["tcpo20".into()], 2021, 2021))
    }

    #[test]
    fn test_query_negates_exclusions() {
        let query = &provider().generate_queries()[0];
        assert_eq!(query.get("text1"), Some("NOT (Correction OR Editorial)"));
        assert_eq!(query.get("SeriesKey"), Some("tcpo20"));
    }

    #[test]
    fn test_parse_page() {
        let body = r#"<html><body>
            <ul><li class="pageLinks">1</li><li class="pageLinks">2</li><li class="pageLinks">next</li></ul>
            <ol class="search-results">
              <li class="search-article-tools">
                <span class="hlFld-Title"><a href="/doi/full/10.1080/14693062.2021.1868392">Climate clubs</a></span>
                <a class="searchResultJournal">Climate Policy</a>
                <span class="publication-year"><span>Published online: </span>11 Jan 2021</span>
              </li>
            </ol>
        </body></html>"#;

        let page = provider().parse_page(body.as_bytes(), 1).unwrap();
        assert_eq!(page.page_count, Some(2));

        let entry = &page.entries[0];
        assert_eq!(entry.doi.as_deref(), Some("10.1080/14693062.2021.1868392"));
        assert_eq!(entry.year, 2021);
        assert_eq!(
            entry.preview_url,
            "https://www.tandfonline.com/doi/full/10.1080/14693062.2021.1868392"
        );
    }
}
