//! Oxford Academic search provider.
//!
//! Oxford listings carry no usable PDF link, so entries only have a preview.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::models::{trailing_year, ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{is_excluded_title, parse_count, ListingPage, SearchProvider, SourceError};
use crate::utils::html::{first_attr, first_text, select_all, select_first, text_of};
use crate::utils::FetchRequest;

const SEARCH_URL: &str = "https://academic.oup.com/journals/search-results?";
const BASE_URL: &str = "https://academic.oup.com";
const PAGE_SIZE: usize = 20;

const DEFAULT_ARTICLE_TYPES: &[&str] = &["Research Article"];

/// Oxford Academic listing search, keyed by the journal display name
#[derive(Debug, Clone)]
pub struct OxfordSearch {
    settings: SearchSettings,
}

impl OxfordSearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn article_types(&self) -> String {
        match &self.settings.article_types {
            Some(types) => types.join("AND"),
            None => DEFAULT_ARTICLE_TYPES.join("AND"),
        }
    }

    fn parse_result(&self, result: ElementRef<'_>) -> Option<ListingEntry> {
        let link = select_first(result, "h4.sri-title a")?;
        let title = text_of(link);
        if is_excluded_title(&title) {
            return None;
        }
        let href = link.value().attr("href")?;

        let doi = first_attr(result, "div.al-citation-list span a", "href")
            .map(|href| href.replace("https://doi.org/", ""));

        Some(ListingEntry {
            publisher: Publisher::Oxford,
            journal: select_first(result, "div:not([class])")
                .and_then(|div| first_text(div, "a"))
                .unwrap_or_default(),
            journal_shortname: self.settings.journal_shortname.clone(),
            doi,
            title,
            year: first_text(result, "div.al-pub-date")
                .map(|date| trailing_year(&date))
                .unwrap_or(0),
            preview_url: format!("{}{}", BASE_URL, href),
            fulltext_url: None,
        })
    }
}

/// Page count from the statistics line, e.g. "1 - 20 of 245"
fn page_count_from_statistics(text: &str) -> Option<usize> {
    let re = Regex::new(r"(\d+)\s*-\s*(\d+)\s+of\s+([\d,]+)").ok()?;
    let captures = re.captures(text)?;
    let per_page = parse_count(captures.get(2)?.as_str())?;
    let total = parse_count(captures.get(3)?.as_str())?;
    (per_page > 0).then(|| total.div_ceil(per_page))
}

#[async_trait]
impl SearchProvider for OxfordSearch {
    fn publisher(&self) -> Publisher {
        Publisher::Oxford
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("f_JournalDisplayName", self.settings.primary_identifier())
                    .param("f_ContentType", "Journal Article")
                    .param("f_ArticleTypeDisplayName", self.article_types())
                    .param("page", 1)
                    .param("sort", "Date - Newest First")
                    .param("rg_ArticleDate", format!("01/01/{} TO 12/31/{}", year, year))
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
            first_text(root, "div.sr-statistics").and_then(|text| page_count_from_statistics(&text))
        } else {
            None
        };

        Ok(ListingPage {
            page_count,
            entries: select_all(root, "div.al-article-box")
                .into_iter()
                .filter_map(|result| self.parse_result(result))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OxfordSearch {
        OxfordSearch::new(SearchSettings::new(
            "rfs",
            vec!["The Review of Financial Studies".into()],
            2020,
            2020,
        ))
    }

    #[test]
    fn test_statistics_page_count() {
        assert_eq!(page_count_from_statistics("1 - 20 of 245"), Some(13));
        assert_eq!(page_count_from_statistics("1-20 of 20"), Some(1));
        assert_eq!(page_count_from_statistics("no results"), None);
    }

    #[test]
    fn test_query_params() {
        let query = &provider().generate_queries()[0];
        let url = provider().page_request(query, 2).url;
        assert!(url.contains("f_JournalDisplayName=The+Review+of+Financial+Studies"));
        assert!(url.contains("rg_ArticleDate=01%2F01%2F2020+TO+12%2F31%2F2020"));
        assert!(url.contains("page=2"));
    }

    #[test]
    fn test_parse_page() {
        let body = r#"<html><body>
            <div class="sr-statistics">1 - 20 of 41</div>
            <div class="al-article-box">
              <h4 class="sri-title"><a href="/rfs/article/33/5/2019/5734655">Shareholder Activism</a></h4>
              <div><a href="/rfs">The Review of Financial Studies</a></div>
              <div class="al-citation-list"><span><a href="https://doi.org/10.1093/rfs/hhz102">doi</a></span></div>
              <div class="al-pub-date">Published: 10 January 2020</div>
            </div>
        </body></html>"#;

        let page = provider().parse_page(body.as_bytes(), 1).unwrap();
        assert_eq!(page.page_count, Some(3));

        let entry = &page.entries[0];
        assert_eq!(entry.doi.as_deref(), Some("10.1093/rfs/hhz102"));
        assert_eq!(entry.journal, "The Review of Financial Studies");
        assert_eq!(entry.year, 2020);
        assert_eq!(entry.preview_url, "https://academic.oup.com/rfs/article/33/5/2019/5734655");
        assert!(entry.fulltext_url.is_none());
    }
}
