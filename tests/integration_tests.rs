//! Integration tests for Journal Harvester
//!
//! These tests run the discovery, download and extraction stages against
//! scripted fetchers and temporary directories.

use journal_harvester::download::{DownloadScheduler, DownloadSettings};
use journal_harvester::models::{DocumentKind, DownloadJob, DownloadSummary, Publisher, SearchSettings, SkipReason};
use journal_harvester::parsers::{self, Document};
use journal_harvester::sources::{search_provider, MockFetcher, SearchProvider};
use journal_harvester::utils::{HttpClient, PageFetcher};
use std::sync::Arc;
use std::time::Duration;

fn fast_settings() -> DownloadSettings {
    DownloadSettings {
        concurrency: 2,
        max_retries: 3,
        delay: Duration::ZERO,
        min_markup_bytes: 64,
        limit: 1400,
    }
}

fn sciencedirect_page(year: i32, first: usize, count: usize, total: usize) -> String {
    let articles: Vec<String> = (first..first + count)
        .map(|i| {
            format!(
                r#"{{"sourceTitle": "Journal of Economic Behavior & Organization",
                    "doi": "10.1016/j.jebo.{year}.{i}",
                    "title": "Article {i}",
                    "publicationDate": "{year}-03-01",
                    "link": "/science/article/pii/S{year}{i}",
                    "pdf": {{"downloadLink": "/science/article/pii/S{year}{i}/pdfft"}}}}"#
            )
        })
        .collect();
    format!(
        r#"{{"resultsFound": {}, "searchResults": [{}]}}"#,
        total,
        articles.join(",")
    )
}

#[tokio::test]
async fn test_pagination_collects_every_page_newest_year_first() {
    let fetcher = MockFetcher::new();
    for year in [2020, 2021] {
        for (page, count) in [(0usize, 100usize), (1, 100), (2, 50)] {
            fetcher.respond(
                &format!("offset={}&docId=271680&date={}", page * 100, year),
                MockFetcher::json(sciencedirect_page(year, page * 100, count, 250)),
            );
        }
    }

    let settings = SearchSettings::new("jebo", vec!["271680".to_string()], 2020, 2021);
    let provider = search_provider(Publisher::Elsevier, settings).unwrap();
    let entries = provider.search(&fetcher).await;

    assert_eq!(fetcher.calls(), 6);
    assert_eq!(entries.len(), 500);
    assert!(entries[..250].iter().all(|e| e.year == 2021));
    assert!(entries[250..].iter().all(|e| e.year == 2020));
    assert_eq!(entries[0].doi.as_deref(), Some("10.1016/j.jebo.2021.0"));
    assert_eq!(entries[249].doi.as_deref(), Some("10.1016/j.jebo.2021.249"));
}

#[tokio::test]
async fn test_failed_page_truncates_only_its_query() {
    let fetcher = MockFetcher::new();
    fetcher.respond(
        "offset=0&docId=271680&date=2021",
        MockFetcher::json(sciencedirect_page(2021, 0, 100, 250)),
    );
    fetcher.fail("offset=100&docId=271680&date=2021", "connection reset");
    fetcher.respond(
        "offset=0&docId=271680&date=2020",
        MockFetcher::json(sciencedirect_page(2020, 0, 10, 10)),
    );

    let settings = SearchSettings::new("jebo", vec!["271680".to_string()], 2020, 2021);
    let entries = search_provider(Publisher::Elsevier, settings)
        .unwrap()
        .search(&fetcher)
        .await;

    assert_eq!(entries.len(), 110);
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn test_download_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.respond("x.test", MockFetcher::pdf(b"%PDF-1.5".to_vec()));

    let jobs: Vec<DownloadJob> = (0..4)
        .map(|i| DownloadJob::new(format!("https://x.test/{i}.pdf"), dir.path().join(format!("f/{i}.pdf"))))
        .collect();
    let scheduler = DownloadScheduler::new(fetcher.clone(), fast_settings());

    let first = scheduler.download(jobs.clone()).await;
    assert_eq!(DownloadSummary::from_outcomes(&first).downloaded, 4);
    assert_eq!(fetcher.calls(), 4);

    let second = scheduler.download(jobs).await;
    assert_eq!(fetcher.calls(), 4);
    assert!(second.iter().all(|o| o.message == "file exists" && !o.downloaded));
    assert_eq!(DownloadSummary::from_outcomes(&second).existing, 4);
}

#[tokio::test]
async fn test_retry_bound_with_failing_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.fail_always();

    let scheduler = DownloadScheduler::new(fetcher.clone(), fast_settings());
    let outcomes = scheduler
        .download(vec![DownloadJob::new("https://down.test/a.pdf", dir.path().join("a.pdf"))])
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].message, "too many retries");
    assert_eq!(outcomes[0].attempts, 3);
    assert_eq!(fetcher.calls(), 3);
    assert!(!dir.path().join("a.pdf").exists());
}

#[tokio::test]
async fn test_interstitial_page_is_never_saved() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.respond("article", MockFetcher::html("<html>Just a moment...</html>"));

    let mut settings = fast_settings();
    settings.min_markup_bytes = 100 * 1024;
    let scheduler = DownloadScheduler::new(fetcher.clone(), settings);
    let target = dir.path().join("previews/a.html");
    let outcomes = scheduler
        .download(vec![DownloadJob::new("https://x.test/article", &target)])
        .await;

    assert!(!outcomes[0].downloaded);
    assert_eq!(fetcher.calls(), 3);
    assert!(!target.exists());
}

#[test]
fn test_corrigendum_is_skipped_without_error() {
    let document = Document::from_html(
        "corrigendum.html",
        r#"<html><head>
            <meta property="og:title" content="Corrigendum: Momentum Crashes">
            <meta name="dc.identifier" content="10.1111/jofi.13000">
        </head><body><p>In the article ...</p></body></html>"#,
    );

    let result = parsers::parse(Publisher::Wiley, &document).unwrap();
    assert!(matches!(result.skipped, Some(SkipReason::Correction(_))));
    assert!(result.paper.is_none());
    assert!(result.authors.is_empty());
}

#[tokio::test]
async fn test_search_download_and_parse_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(MockFetcher::new());

    fetcher.respond(
        "/articles/s41562-020-0900-1",
        MockFetcher::html(
            r#"<html><head>
                <meta name="DOI" content="10.1038/s41562-020-0900-1">
                <meta name="citation_title" content="Norms in the wild">
                <meta name="dc.description" content="We observe norms.">
                <meta name="citation_publication_date" content="2020/08/03">
                <meta name="citation_author" content="Ines Costa">
                <meta name="citation_author_institution" content="Nova SBE">
            </head><body><article>Full article page</article></body></html>"#,
        ),
    );
    fetcher.respond(
        "nature.com/search?",
        MockFetcher::html(
            r#"<html><body>
            <div class="filter-results"><p>Showing 1–1 of 1 results</p></div>
            <ol class="clean-list">
              <li itemtype="http://schema.org/Article">
                <h2 itemprop="headline"><a href="/articles/s41562-020-0900-1">Norms in the wild</a></h2>
                <a class="emphasis text-gray">Nature Human Behaviour</a>
                <time itemprop="datePublished" datetime="2020-08-03">03 Aug 2020</time>
              </li>
            </ol></body></html>"#,
        ),
    );

    let settings = SearchSettings::new("nathumbehav", vec!["nathumbehav".to_string()], 2020, 2020);
    let entries = search_provider(Publisher::Nature, settings)
        .unwrap()
        .search(fetcher.as_ref())
        .await;
    assert_eq!(entries.len(), 1);

    let jobs = DownloadScheduler::jobs_for(&entries, DocumentKind::Preview, dir.path());
    let outcomes = DownloadScheduler::new(fetcher.clone(), fast_settings())
        .download(jobs)
        .await;
    assert_eq!(outcomes[0].message, "saved html");

    let result = parsers::parse_entry(&entries[0], dir.path()).unwrap();
    let paper = result.paper.unwrap();
    assert_eq!(paper.doi, "10.1038/s41562-020-0900-1");
    assert_eq!(paper.year, "2020");
    assert_eq!(result.authors[0].affiliations, vec!["Nova SBE"]);
}

#[tokio::test]
async fn test_http_client_fetch() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/listing")
        .match_header("user-agent", mockito::Matcher::Regex("Mozilla".to_string()))
        .match_header("x-test", "yes")
        .with_status(200)
        .with_header("content-type", "text/html; charset=UTF-8")
        .with_body("<html><body>ok</body></html>")
        .create_async()
        .await;

    let client = HttpClient::new().unwrap();
    let request = journal_harvester::utils::FetchRequest::new(format!("{}/listing", server.url()))
        .header("X-Test", "yes");
    let response = client.fetch(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    assert!(response.is_markup());
    assert_eq!(response.text(), "<html><body>ok</body></html>");
}

#[tokio::test]
async fn test_http_client_reports_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let client = HttpClient::new().unwrap();
    let response = client.get(&format!("{}/missing", server.url())).await.unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
}
