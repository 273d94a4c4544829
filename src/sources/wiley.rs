//! Wiley Online Library search provider.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::models::{trailing_year, ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{
    is_excluded_title, matches_exclusion, ListingPage, SearchProvider, SourceError,
};
use crate::utils::html::{first_text, select_all, select_first, text_of};
use crate::utils::FetchRequest;

const SEARCH_URL: &str = "https://onlinelibrary.wiley.com/action/doSearch?";
const PREVIEW_URL: &str = "https://onlinelibrary.wiley.com/doi/";
const FULLTEXT_URL: &str = "https://onlinelibrary.wiley.com/doi/pdfdirect/";
const PAGE_SIZE: usize = 100;

/// Article types (as shown in `span.meta__type`) that are not research
const DEFAULT_EXCLUSIONS: &[&str] = &["Corrigendum", "Erratum", "Issue Information"];

/// Wiley Online Library listing search
///
/// Journals are identified by ISSN; dashes are removed for the search field.
#[derive(Debug, Clone)]
pub struct WileySearch {
    settings: SearchSettings,
}

impl WileySearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn exclusions(&self) -> Vec<String> {
        match &self.settings.exclusions {
            Some(exclusions) => exclusions.clone(),
            None => DEFAULT_EXCLUSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn parse_result(&self, result: ElementRef<'_>, exclusions: &[String]) -> Option<ListingEntry> {
        let article_type = first_text(result, "span.meta__type").unwrap_or_default();
        if matches_exclusion(&article_type, exclusions) {
            tracing::debug!("Skipping {} listing entry", article_type);
            return None;
        }

        let link = select_first(result, "a.publication_title")?;
        let title = text_of(link);
        if is_excluded_title(&title) {
            return None;
        }
        let doi = link.value().attr("href")?.replace("/doi/", "");

        Some(ListingEntry {
            publisher: Publisher::Wiley,
            journal: first_text(result, "a.publication_meta_serial").unwrap_or_default(),
            journal_shortname: self.settings.journal_shortname.clone(),
            title,
            year: first_text(result, "p.meta__epubDate")
                .map(|date| trailing_year(&date))
                .unwrap_or(0),
            preview_url: format!("{}{}", PREVIEW_URL, doi),
            fulltext_url: Some(format!("{}{}?download=true", FULLTEXT_URL, doi)),
            doi: Some(doi),
        })
    }
}

#[async_trait]
impl SearchProvider for WileySearch {
    fn publisher(&self) -> Publisher {
        Publisher::Wiley
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        let issns = self
            .settings
            .identifiers
            .iter()
            .map(|id| id.replace('-', ""))
            .collect::<Vec<_>>()
            .join(" ");

        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("field1", "AllField")
                    .param("text1", &issns)
                    .param("AfterMonth", 1)
                    .param("BeforeMonth", 12)
                    .param("startPage", 0)
                    .param("pageSize", PAGE_SIZE)
                    .param("sortBy", "Earliest")
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

        let page_count = if page == 1 {
            select_first(root, "ul.pagination__list").map(|list| select_all(list, "li").len())
        } else {
            None
        };

        let exclusions = self.exclusions();
        Ok(ListingPage {
            page_count,
            entries: select_all(root, "li.search__item")
                .into_iter()
                .filter_map(|result| self.parse_result(result, &exclusions))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> WileySearch {
        WileySearch::new(SearchSettings::new("jf", vec!["1540-6261".into()], 2019, 2020))
    }

    fn item(kind: &str, doi: &str, title: &str) -> String {
        format!(
            r#"<li class="search__item">
                <span class="meta__type">{kind}</span>
                <a class="publication_title" href="/doi/{doi}">{title}</a>
                <a class="publication_meta_serial">The Journal of Finance</a>
                <p class="meta__epubDate"><span>First published: </span>04 February 2020</p>
            </li>"#
        )
    }

    #[test]
    fn test_queries_strip_issn_dashes() {
        let queries = provider().generate_queries();
        assert_eq!(queries[0].get("text1"), Some("15406261"));
        assert_eq!(queries[0].get("AfterYear"), Some("2020"));

        let request = provider().page_request(&queries[0], 2);
        assert!(request.url.contains("startPage=1"));
    }

    #[test]
    fn test_parse_page_applies_type_exclusions() {
        let body = format!(
            r#"<html><body>
                <ul class="pagination__list"><li>1</li><li>2</li><li>3</li></ul>
                <ul>{}{}{}</ul>
            </body></html>"#,
            item("Research Article", "10.1111/jofi.12868", "Carbon Risk"),
            item("Issue Information", "10.1111/jofi.12870", "Issue Information"),
            item("Corrigendum", "10.1111/jofi.12871", "Corrigendum"),
        );

        let page = provider().parse_page(body.as_bytes(), 1).unwrap();
        assert_eq!(page.page_count, Some(3));
        assert_eq!(page.entries.len(), 1);

        let entry = &page.entries[0];
        assert_eq!(entry.doi.as_deref(), Some("10.1111/jofi.12868"));
        assert_eq!(entry.year, 2020);
        assert_eq!(entry.journal, "The Journal of Finance");
        assert_eq!(
            entry.fulltext_url.as_deref(),
            Some("https://onlinelibrary.wiley.com/doi/pdfdirect/10.1111/jofi.12868?download=true")
        );
    }
}
