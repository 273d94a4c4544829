//! Nature Research search provider.
//!
//! Nature article ids become DOIs under the fixed `10.1038/` prefix.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::models::{leading_year, ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{is_excluded_title, parse_count, ListingPage, SearchProvider, SourceError};
use crate::utils::html::{first_attr, first_text, select_all, select_first, text_of};
use crate::utils::FetchRequest;

const SEARCH_URL: &str = "https://www.nature.com/search?";
const BASE_URL: &str = "https://www.nature.com";
const DOI_PREFIX: &str = "10.1038/";
const PAGE_SIZE: usize = 50;

const DEFAULT_ARTICLE_TYPES: &[&str] = &["research", "comments-and-opinion", "reviews"];

/// nature.com listing search, keyed by the journal's url slug
#[derive(Debug, Clone)]
pub struct NatureSearch {
    settings: SearchSettings,
}

impl NatureSearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn article_types(&self) -> String {
        match &self.settings.article_types {
            Some(types) => types.join(","),
            None => DEFAULT_ARTICLE_TYPES.join(","),
        }
    }

    fn parse_result(&self, result: ElementRef<'_>) -> Option<ListingEntry> {
        let link = select_first(result, "h2[itemprop=\"headline\"] a")?;
        let title = text_of(link);
        if is_excluded_title(&title) {
            return None;
        }
        let article_id = link.value().attr("href")?.replace("/articles/", "");

        Some(ListingEntry {
            publisher: Publisher::Nature,
            journal: first_text(result, "a.emphasis.text-gray").unwrap_or_default(),
            journal_shortname: self.settings.journal_shortname.clone(),
            doi: Some(format!("{}{}", DOI_PREFIX, article_id)),
            title,
            year: first_attr(result, "time[itemprop=\"datePublished\"]", "datetime")
                .map(|date| leading_year(&date))
                .unwrap_or(0),
            preview_url: format!("{}/articles/{}", BASE_URL, article_id),
            fulltext_url: Some(format!("{}/articles/{}.pdf", BASE_URL, article_id)),
        })
    }
}

/// Total result count from e.g. "Showing 1–50 of 123 results"
fn result_count(text: &str) -> Option<usize> {
    let re = Regex::new(r"of\s+([\d,]+)").ok()?;
    let captures = re.captures(text)?;
    parse_count(captures.get(1)?.as_str())
}

#[async_trait]
impl SearchProvider for NatureSearch {
    fn publisher(&self) -> Publisher {
        Publisher::Nature
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("order", "date_desc")
                    .param("article_type", self.article_types())
                    .param("journal", self.settings.primary_identifier())
                    .param("date_range", format!("{}-{}", year, year))
                    .param("page", 1)
            })
            .collect()
    }

    fn page_request(&self, query: &ListingQuery, page: usize) -> FetchRequest {
        let mut query = query.clone();
        query.set("page", page);
        FetchRequest::new(query.url(SEARCH_URL))
    }

    fn parse_page(&self, body: &[u8], page: usize) -> Result<ListingPage, SourceError> {
        let html = Html::parse_document(&String::from_utf8_lossy(body));
        let root = html.root_element();

        let page_count = if page == 1 {
            first_text(root, "div.filter-results p")
                .and_then(|text| result_count(&text))
                .map(|count| count.div_ceil(PAGE_SIZE))
        } else {
            None
        };

        let list = select_first(root, "ol.clean-list")
            .ok_or_else(|| SourceError::Parse("Nature result list not found".to_string()))?;

        Ok(ListingPage {
            page_count,
            entries: select_all(list, "li[itemtype=\"http://schema.org/Article\"]")
                .into_iter()
                .filter_map(|result| self.parse_result(result))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> NatureSearch {
        NatureSearch::new(SearchSettings::new(
            "nathumbehav",
            vec!["nathumbehav".into()],
            2020,
            2020,
        ))
    }

    #[test]
    fn test_result_count() {
        assert_eq!(result_count("Showing 1–50 of 123 results"), Some(123));
        assert_eq!(result_count("Showing 1–50 of 1,230 results"), Some(1230));
        assert_eq!(result_count("No results"), None);
    }

    #[test]
    fn test_query_params() {
        let query = &provider().generate_queries()[0];
        assert_eq!(query.get("date_range"), Some("2020-2020"));
        assert_eq!(query.get("article_type"), Some("research,comments-and-opinion,reviews"));
        assert!(provider().page_request(query, 3).url.contains("page=3"));
    }

    #[test]
    fn test_parse_page() {
        let body = r#"<html><body>
            <div class="filter-results"><p>Showing <span>1–50</span> of <span>123</span> results</p></div>
            <ol class="clean-list">
              <li itemtype="http://schema.org/Article">
                <h2 itemprop="headline"><a href="/articles/s41562-019-0793-1">How people decide what they want to know</a></h2>
                <a class="emphasis text-gray">Nature Human Behaviour</a>
                <time itemprop="datePublished" datetime="2020-01-13">13 Jan 2020</time>
              </li>
            </ol>
        </body></html>"#;

        let page = provider().parse_page(body.as_bytes(), 1).unwrap();
        assert_eq!(page.page_count, Some(3));

        let entry = &page.entries[0];
        assert_eq!(entry.doi.as_deref(), Some("10.1038/s41562-019-0793-1"));
        assert_eq!(entry.journal, "Nature Human Behaviour");
        assert_eq!(entry.year, 2020);
        assert_eq!(
            entry.fulltext_url.as_deref(),
            Some("https://www.nature.com/articles/s41562-019-0793-1.pdf")
        );
    }
}
