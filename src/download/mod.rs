//! Download scheduler for previews and full texts.
//!
//! Each [`DownloadJob`] runs in its own tokio task; a semaphore bounds how many
//! run at once. Jobs are idempotent: an existing target file is reported and
//! never fetched again. Fetches are retried with a fixed delay, and a markup
//! response must exceed a minimum size to count, since publishers answer bot
//! checks with small "please wait" pages and a 200 status.
//!
//! # Example
//!
//! ```no_run
//! use journal_harvester::download::{DownloadScheduler, DownloadSettings};
//! use journal_harvester::models::DownloadJob;
//! use journal_harvester::utils::HttpClient;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = DownloadScheduler::new(Arc::new(HttpClient::new()?), DownloadSettings::default());
//! let jobs = vec![DownloadJob::new("https://example.org/a.pdf", "files/a.pdf")];
//! for outcome in scheduler.download(jobs).await {
//!     println!("{}: {}", outcome.job.target_path.display(), outcome.message);
//! }
//! # Ok(())
//! # }
//! ```

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::models::{DocumentKind, DownloadJob, DownloadOutcome, ListingEntry};
use crate::utils::{with_retry, FetchResponse, PageFetcher, RetryConfig, RetryResult};

/// Tuning knobs of the download scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Jobs running at the same time
    pub concurrency: usize,

    /// Fetch attempts per job
    pub max_retries: u32,

    /// Pause between attempts and after each saved document
    #[serde(with = "crate::utils::duration_secs")]
    pub delay: Duration,

    /// Markup responses up to this size are treated as interstitial pages
    pub min_markup_bytes: usize,

    /// Jobs beyond this many are not scheduled
    pub limit: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_retries: 2,
            delay: Duration::from_secs(1),
            min_markup_bytes: 100 * 1024,
            limit: 1400,
        }
    }
}

impl DownloadSettings {
    fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.delay)
    }
}

/// Why one fetch attempt was not accepted
#[derive(Debug, Clone)]
struct AttemptFailure {
    status: Option<u16>,
    reason: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// Runs download jobs over a bounded pool of tokio tasks
#[derive(Debug, Clone)]
pub struct DownloadScheduler {
    fetcher: Arc<dyn PageFetcher>,
    settings: DownloadSettings,
}

impl DownloadScheduler {
    /// Create a scheduler; a concurrency of zero is raised to one
    pub fn new(fetcher: Arc<dyn PageFetcher>, mut settings: DownloadSettings) -> Self {
        settings.concurrency = settings.concurrency.max(1);
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    /// Jobs for one document kind of every entry that has a DOI and a URL for it
    pub fn jobs_for(entries: &[ListingEntry], kind: DocumentKind, base_dir: &Path) -> Vec<DownloadJob> {
        entries
            .iter()
            .filter_map(|entry| DownloadJob::from_entry(entry, kind, base_dir))
            .collect()
    }

    /// Download every job and return exactly one outcome per job.
    ///
    /// Outcomes arrive in completion order. A job whose task panics is
    /// reported with a `"worker failed: ..."` outcome. Jobs beyond
    /// `settings.limit` are not fetched and come last with a
    /// `"not scheduled"` outcome.
    pub async fn download(&self, jobs: Vec<DownloadJob>) -> Vec<DownloadOutcome> {
        self.download_with_progress(jobs, |_| {}).await
    }

    /// Like [`download`](Self::download), calling `on_outcome` as each job finishes
    pub async fn download_with_progress<F>(
        &self,
        mut jobs: Vec<DownloadJob>,
        mut on_outcome: F,
    ) -> Vec<DownloadOutcome>
    where
        F: FnMut(&DownloadOutcome) + Send,
    {
        let unscheduled = if jobs.len() > self.settings.limit {
            info!(
                "Scheduling the first {} of {} download jobs",
                self.settings.limit,
                jobs.len()
            );
            jobs.split_off(self.settings.limit)
        } else {
            Vec::new()
        };

        info!(
            jobs = jobs.len(),
            concurrency = self.settings.concurrency,
            "Starting downloads"
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut pending = FuturesUnordered::new();

        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.fetcher);
            let settings = self.settings;
            let task_job = job.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return DownloadOutcome::failed(task_job, format!("worker failed: {}", e), None, 0)
                    }
                };
                download_job(fetcher.as_ref(), &settings, task_job).await
            });

            pending.push(async move {
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Download task for {} failed: {}", job.source_url, e);
                        DownloadOutcome::failed(job, format!("worker failed: {}", e), None, 0)
                    }
                }
            });
        }

        let mut outcomes = Vec::with_capacity(pending.len() + unscheduled.len());
        while let Some(outcome) = pending.next().await {
            on_outcome(&outcome);
            outcomes.push(outcome);
        }
        for job in unscheduled {
            let outcome = DownloadOutcome::not_scheduled(job);
            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        let saved = outcomes.iter().filter(|o| o.downloaded).count();
        info!("Downloads finished: {} saved, {} total", saved, outcomes.len());
        outcomes
    }
}

/// Process one job: skip existing files, otherwise fetch with retries and save
async fn download_job(
    fetcher: &dyn PageFetcher,
    settings: &DownloadSettings,
    job: DownloadJob,
) -> DownloadOutcome {
    if let Some(parent) = job.target_path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            return DownloadOutcome::failed(job, format!("write failed: {}", e), None, 0);
        }
    }

    if tokio::fs::try_exists(&job.target_path).await.unwrap_or(false) {
        debug!("{} exists", job.target_path.display());
        return DownloadOutcome::exists(job);
    }

    debug!("Downloading {} to {}", job.source_url, job.target_path.display());

    let result = with_retry(settings.retry_config(), |_attempt| {
        fetch_accepted(fetcher, &job.source_url, settings.min_markup_bytes)
    })
    .await;

    let (response, attempts) = match result {
        RetryResult::Success(response, attempts) => (response, attempts),
        RetryResult::Exhausted(last_error, attempts) => {
            let status = last_error.and_then(|e| e.status);
            warn!("Giving up on {} after {} attempts", job.source_url, attempts);
            return DownloadOutcome::failed(job, "too many retries", status, attempts);
        }
    };

    let write = if response.is_markup() {
        tokio::fs::write(&job.target_path, response.text()).await.map(|_| "saved html")
    } else {
        tokio::fs::write(&job.target_path, &response.body).await.map(|_| "saved binary")
    };

    let outcome = match write {
        Ok(message) => DownloadOutcome::saved(job, message, response.status, attempts),
        Err(e) => {
            return DownloadOutcome::failed(
                job,
                format!("write failed: {}", e),
                Some(response.status),
                attempts,
            )
        }
    };

    if !settings.delay.is_zero() {
        tokio::time::sleep(settings.delay).await;
    }
    outcome
}

/// Fetch once and accept only a 2xx response that is not an interstitial page
async fn fetch_accepted(
    fetcher: &dyn PageFetcher,
    url: &str,
    min_markup_bytes: usize,
) -> Result<FetchResponse, AttemptFailure> {
    let response = fetcher.get(url).await.map_err(|e| AttemptFailure {
        status: None,
        reason: e.to_string(),
    })?;

    if !response.is_success() {
        return Err(AttemptFailure {
            status: Some(response.status),
            reason: "unsuccessful status".to_string(),
        });
    }

    if response.is_markup() && response.body.len() <= min_markup_bytes {
        return Err(AttemptFailure {
            status: Some(response.status),
            reason: format!("markup page of {} bytes looks like an interstitial", response.body.len()),
        });
    }

    Ok(response)
}
