//! Cambridge Core search provider.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::models::{trailing_year, ListingEntry, ListingQuery, Publisher, SearchSettings};
use crate::sources::{is_excluded_title, parse_count, ListingPage, SearchProvider, SourceError};
use crate::utils::html::{first_attr, first_text, select_all, select_first, text_of};
use crate::utils::FetchRequest;

const SEARCH_URL: &str = "https://www.cambridge.org/core/what-we-publish/journals/listing?";
const BASE_URL: &str = "https://www.cambridge.org";
const PAGE_SIZE: usize = 20;

/// Cambridge Core listing search, keyed by the journal's product id
#[derive(Debug, Clone)]
pub struct CambridgeSearch {
    settings: SearchSettings,
}

impl CambridgeSearch {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    fn parse_result(&self, result: ElementRef<'_>) -> Option<ListingEntry> {
        let details = select_first(result, "ul.details")?;
        let link = select_first(details, "li.title h5 a")?;
        let title = text_of(link);
        if is_front_matter(&title) || is_excluded_title(&title) {
            tracing::debug!("Skipping listing entry '{}'", title);
            return None;
        }

        Some(ListingEntry {
            publisher: Publisher::Cambridge,
            journal: first_text(details, "li.source a").unwrap_or_default(),
            journal_shortname: self.settings.journal_shortname.clone(),
            doi: first_attr(result, "div[data-doi]", "data-doi").filter(|d| !d.is_empty()),
            year: first_text(details, "li.published span.date")
                .map(|date| trailing_year(&date))
                .unwrap_or(0),
            preview_url: format!("{}{}", BASE_URL, link.value().attr("href")?),
            fulltext_url: first_attr(details, "a[data-pdf-content-id]", "href")
                .map(|href| format!("{}{}", BASE_URL, href)),
            title,
        })
    }
}

/// Cover and back matter rows are titled like "Volume 55 issue 2 Cover and Front matter"
fn is_front_matter(title: &str) -> bool {
    let title = title.to_lowercase();
    ["issue", "volume", "matter"]
        .iter()
        .all(|word| title.contains(word))
}

#[async_trait]
impl SearchProvider for CambridgeSearch {
    fn publisher(&self) -> Publisher {
        Publisher::Cambridge
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn generate_queries(&self) -> Vec<ListingQuery> {
        self.settings
            .years_newest_first()
            .map(|year| {
                ListingQuery::new(year, PAGE_SIZE)
                    .param("aggs[productTypes][filters]", "JOURNAL_ARTICLE")
                    .param("aggs[productJournal][filters]", self.settings.primary_identifier())
                    .param("sort", "canonical.date:desc")
                    .param("pageNum", 1)
                    .param("filters[dateYearRange][from]", year)
                    .param("filters[dateYearRange][to]", year)
            })
            .collect()
    }

    fn page_request(&self, query: &ListingQuery, page: usize) -> FetchRequest {
        let mut query = query.clone();
        query.set("pageNum", page);
        FetchRequest::new(query.url(SEARCH_URL))
    }

    fn parse_page(&self, body: &[u8], page: usize) -> Result<ListingPage, SourceError> {
        let html = Html::parse_document(&String::from_utf8_lossy(body));
        let root = html.root_element();

        let page_count = if page == 1 {
            select_all(root, "ul.pagination li a[data-page-number]")
                .last()
                .and_then(|a| a.value().attr("data-page-number"))
                .and_then(parse_count)
        } else {
            None
        };

        Ok(ListingPage {
            page_count,
            entries: select_all(root, "div.product-listing-with-inputs-content")
                .into_iter()
                .filter_map(|result| self.parse_result(result))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> CambridgeSearch {
        CambridgeSearch::new(SearchSettings::new(
            "jfqa",
            vec!["FB35548FF614F4556E96D01FA2CB412E".into()],
            2020,
            2020,
        ))
    }

    fn row(doi: Option<&str>, title: &str, pdf: bool) -> String {
        let doi = doi
            .map(|d| format!(r#"<div data-doi="{d}"></div>"#))
            .unwrap_or_default();
        let pdf = if pdf {
            r#"<a data-pdf-content-id="X1" href="/core/services/aop-cambridge-core/content/view/X1">PDF</a>"#
        } else {
            ""
        };
        format!(
            r#"<div class="product-listing-with-inputs-content">{doi}
                <ul class="details">
                  <li class="title"><h5><a href="/core/journals/jfqa/article/x">{title}</a></h5></li>
                  <li class="source"><a>Journal of Financial and Quantitative Analysis</a></li>
                  <li class="published"><span class="date">12 March 2020</span></li>
                  <li>{pdf}</li>
                </ul>
            </div>"#
        )
    }

    #[test]
    fn test_front_matter_detection() {
        assert!(is_front_matter("JFQ volume 55 issue 2 Cover and Front matter"));
        assert!(!is_front_matter("Issue salience and market reactions"));
    }

    #[test]
    fn test_parse_page() {
        let body = format!(
            r#"<html><body>
                <ul class="pagination">
                  <li><a data-page-number="1">1</a></li>
                  <li><a data-page-number="2">2</a></li>
                  <li><a data-page-number="7">Last</a></li>
                </ul>
                {}{}{}
            </body></html>"#,
            row(Some("10.1017/S0022109019000899"), "Option-implied dependence", true),
            row(None, "Noise trading and price discovery", false),
            row(None, "JFQ volume 55 issue 2 Cover and Back matter", false),
        );

        let page = provider().parse_page(body.as_bytes(), 1).unwrap();
        assert_eq!(page.page_count, Some(7));
        assert_eq!(page.entries.len(), 2);

        assert_eq!(page.entries[0].doi.as_deref(), Some("10.1017/S0022109019000899"));
        assert_eq!(page.entries[0].year, 2020);
        assert_eq!(
            page.entries[0].fulltext_url.as_deref(),
            Some("https://www.cambridge.org/core/services/aop-cambridge-core/content/view/X1")
        );
        assert!(page.entries[1].doi.is_none());
        assert!(page.entries[1].fulltext_url.is_none());
    }
}
