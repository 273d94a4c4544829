//! Harvest one year of a Springer journal end to end.
//!
//! Lists the articles, downloads their landing pages into `./data`, then
//! prints the authors found on each page.
//!
//! ```sh
//! cargo run --example pipeline
//! ```

use journal_harvester::download::{DownloadScheduler, DownloadSettings};
use journal_harvester::models::{DocumentKind, DownloadSummary, Publisher, SearchSettings};
use journal_harvester::parsers;
use journal_harvester::sources::{search_provider, SearchProvider};
use journal_harvester::utils::HttpClient;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("journal_harvester=info")
        .with_writer(std::io::stderr)
        .init();

    let base_dir = Path::new("./data");
    let fetcher = Arc::new(HttpClient::new()?);

    // Experimental Economics, series 10683
    let settings = SearchSettings::new("exex", vec!["10683".to_string()], 2020, 2020);
    let provider = search_provider(Publisher::Springer, settings)?;
    let entries = provider.search(fetcher.as_ref()).await;
    println!("Found {} articles", entries.len());

    let scheduler = DownloadScheduler::new(
        fetcher.clone(),
        DownloadSettings {
            limit: 20,
            ..DownloadSettings::default()
        },
    );
    let jobs = DownloadScheduler::jobs_for(&entries, DocumentKind::Preview, base_dir);
    let summary = DownloadSummary::from_outcomes(&scheduler.download(jobs).await);
    println!(
        "{} downloaded, {} already present, {} failed",
        summary.downloaded, summary.existing, summary.failed
    );

    for entry in &entries {
        match parsers::parse_entry(entry, base_dir) {
            Ok(result) if result.is_skipped() => {
                println!("\n{} (skipped)", entry.title);
            }
            Ok(result) => {
                println!("\n{}", entry.title);
                for author in &result.authors {
                    let emails: Vec<&str> = author.emails.iter().map(String::as_str).collect();
                    println!(
                        "   {} <{}> {}",
                        author.name,
                        emails.join(", "),
                        author.affiliations.join("; ")
                    );
                }
            }
            Err(e) => eprintln!("\n{}: {}", entry.title, e),
        }
    }

    Ok(())
}
