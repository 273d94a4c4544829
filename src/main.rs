use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use journal_harvester::config::{get_config, load_config, save_config, Config};
use journal_harvester::download::DownloadScheduler;
use journal_harvester::models::{
    DocumentKind, DownloadSummary, ExtractionResult, ListingEntry, Publisher, SearchSettings,
};
use journal_harvester::parsers::{self, Document};
use journal_harvester::sources::scopus::ScopusClient;
use journal_harvester::sources::search_provider;
use journal_harvester::ui::{DownloadProgress, Spinner};
use journal_harvester::utils::HttpClient;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Journal Harvester - Collect article pages, full texts and author contacts from journal publishers
#[derive(Parser, Debug)]
#[command(name = "journal-harvester")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collect article pages, full texts and author contacts from journal publishers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which stored document to download
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    /// Article landing pages
    Preview,
    /// Article PDFs
    Fulltext,
}

impl From<Kind> for DocumentKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Preview => DocumentKind::Preview,
            Kind::Fulltext => DocumentKind::FullText,
        }
    }
}

/// Journal selection, either from the config file or given in full
#[derive(clap::Args, Debug, Clone)]
struct JournalArgs {
    /// Journal short name (looked up in the config file unless --publisher and --id are given)
    journal: String,

    /// Publisher (elsevier, springer, wiley, tandf, nature, oxford, cambridge)
    #[arg(long, short)]
    publisher: Option<Publisher>,

    /// Publisher-specific journal identifier (repeatable)
    #[arg(long = "id")]
    identifiers: Vec<String>,

    /// First year (inclusive)
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year (inclusive)
    #[arg(long)]
    end_year: Option<i32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the articles of a journal from the publisher's listing pages
    #[command(alias = "s")]
    Search {
        #[command(flatten)]
        journal: JournalArgs,

        /// Write the entries to this JSON file instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Download landing pages or PDFs for listing entries
    #[command(alias = "d")]
    Download {
        /// JSON file of listing entries, as written by `search`
        entries: PathBuf,

        /// Document to download
        #[arg(long, short, value_enum, default_value_t = Kind::Preview)]
        kind: Kind,
    },

    /// Extract papers and authors from stored landing pages
    #[command(alias = "p")]
    Parse {
        /// Publisher of the pages
        #[arg(long, short)]
        publisher: Publisher,

        /// Stored landing pages (`.../previews/*.html`)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Fetch article metadata for a journal and year from the Scopus API
    Scopus {
        /// Journal title as indexed by Scopus
        journal_title: String,

        /// Publication year
        #[arg(long, short)]
        year: i32,
    },

    /// Search, download and parse a journal in one run
    Harvest {
        #[command(flatten)]
        journal: JournalArgs,

        /// Skip PDF downloads
        #[arg(long)]
        no_fulltext: bool,
    },

    /// Write a configuration file with default settings
    InitConfig {
        /// Where to write the file
        #[arg(default_value = "journal-harvester.toml")]
        path: PathBuf,
    },
}

/// Parsed document with the file it came from
#[derive(Serialize)]
struct ParsedFile {
    path: PathBuf,
    #[serde(flatten)]
    result: Option<ExtractionResult>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("journal_harvester={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file if specified or found in default locations
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => get_config()?,
    };

    let fetcher = Arc::new(HttpClient::with_timeout(Duration::from_secs(cli.timeout))?);

    match cli.command {
        Commands::Search { journal, out } => {
            let (publisher, settings) = resolve_journal(&config, &journal)?;
            let entries = search(fetcher.as_ref(), publisher, settings).await?;
            match out {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&entries)?)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} entries to {}", entries.len(), path.display());
                }
                None => print_json(&entries, cli.compact)?,
            }
        }

        Commands::Download { entries, kind } => {
            let content = std::fs::read_to_string(&entries)
                .with_context(|| format!("failed to read {}", entries.display()))?;
            let entries: Vec<ListingEntry> = serde_json::from_str(&content)?;
            let summary = download(fetcher, &config, &entries, kind.into()).await;
            print_json(&summary, cli.compact)?;
        }

        Commands::Parse { publisher, files } => {
            let parsed: Vec<ParsedFile> = files
                .into_iter()
                .map(|path| parse_file(publisher, path))
                .collect();
            print_json(&parsed, cli.compact)?;
        }

        Commands::Scopus {
            journal_title,
            year,
        } => {
            let Some(api_key) = config.elsevier_api_key() else {
                bail!("an Elsevier API key is required: set api_keys.elsevier or ELSEVIER_API_KEY");
            };
            let client = ScopusClient::new(api_key, config.scopus)?;
            let spinner = Spinner::new(&format!("Querying Scopus for {} {}", journal_title, year));
            match client.fetch_metadata(fetcher.as_ref(), &journal_title, year).await {
                Ok(records) => {
                    spinner.finish_with_success(&format!("Found {} records", records.len()));
                    print_json(&records, cli.compact)?;
                }
                Err(e) => {
                    spinner.finish_with_error(&e.to_string());
                    return Err(e.into());
                }
            }
        }

        Commands::Harvest {
            journal,
            no_fulltext,
        } => {
            let (publisher, settings) = resolve_journal(&config, &journal)?;
            let entries = search(fetcher.as_ref(), publisher, settings).await?;

            let previews = download(fetcher.clone(), &config, &entries, DocumentKind::Preview).await;
            tracing::info!(
                "Previews: {} downloaded, {} existing, {} failed",
                previews.downloaded,
                previews.existing,
                previews.failed
            );
            if !no_fulltext {
                let fulltexts = download(fetcher.clone(), &config, &entries, DocumentKind::FullText).await;
                tracing::info!(
                    "Full texts: {} downloaded, {} existing, {} failed",
                    fulltexts.downloaded,
                    fulltexts.existing,
                    fulltexts.failed
                );
            }

            let base_dir = &config.storage.base_dir;
            let parsed: Vec<ParsedFile> = entries
                .iter()
                .filter_map(|entry| DocumentKind::Preview.target_path(entry, base_dir))
                .filter(|path| path.is_file())
                .map(|path| parse_file(publisher, path))
                .collect();
            print_json(&parsed, cli.compact)?;
        }

        Commands::InitConfig { path } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            save_config(&Config::default(), &path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Search settings from the command line, falling back to the config file
fn resolve_journal(config: &Config, args: &JournalArgs) -> Result<(Publisher, SearchSettings)> {
    if let (Some(publisher), false) = (args.publisher, args.identifiers.is_empty()) {
        let (Some(start_year), Some(end_year)) = (args.start_year, args.end_year) else {
            bail!("--start-year and --end-year are required with --publisher and --id");
        };
        let settings = SearchSettings::new(&args.journal, args.identifiers.clone(), start_year, end_year);
        return Ok((publisher, settings));
    }

    let Some(journal) = config.journal(&args.journal) else {
        bail!(
            "journal '{}' is not configured; add it to the config file or pass --publisher and --id",
            args.journal
        );
    };
    let mut settings = journal.search_settings();
    if let Some(year) = args.start_year {
        settings.start_year = year;
    }
    if let Some(year) = args.end_year {
        settings.end_year = year;
    }
    Ok((journal.publisher, settings))
}

async fn search(
    fetcher: &HttpClient,
    publisher: Publisher,
    settings: SearchSettings,
) -> Result<Vec<ListingEntry>> {
    let provider = search_provider(publisher, settings)?;
    let spinner = Spinner::new(&format!(
        "Searching {} listings of {}",
        publisher.name(),
        provider.settings().journal_shortname
    ));
    let entries = provider.search(fetcher).await;
    spinner.finish_with_success(&format!("Found {} articles", entries.len()));
    Ok(entries)
}

async fn download(
    fetcher: Arc<HttpClient>,
    config: &Config,
    entries: &[ListingEntry],
    kind: DocumentKind,
) -> DownloadSummary {
    let jobs = DownloadScheduler::jobs_for(entries, kind, &config.storage.base_dir);
    let scheduler = DownloadScheduler::new(fetcher, config.downloads);

    let progress = DownloadProgress::new(jobs.len());
    let outcomes = scheduler
        .download_with_progress(jobs, |outcome| progress.record(outcome))
        .await;
    let summary = DownloadSummary::from_outcomes(&outcomes);
    progress.finish(&summary);
    summary
}

fn parse_file(publisher: Publisher, path: PathBuf) -> ParsedFile {
    let parsed = Document::read(&path).and_then(|document| parsers::parse(publisher, &document));
    match parsed {
        Ok(result) => ParsedFile {
            path,
            result: Some(result),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Could not parse {}: {}", path.display(), e);
            ParsedFile {
                path,
                result: None,
                error: Some(e.to_string()),
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
