//! Download jobs and their outcomes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ListingEntry;

/// Which document of an article to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// The article landing page (HTML)
    Preview,
    /// The article PDF
    FullText,
}

impl DocumentKind {
    /// Directory name under the journal directory
    pub fn dir_name(&self) -> &'static str {
        match self {
            DocumentKind::Preview => "previews",
            DocumentKind::FullText => "fulltexts",
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Preview => "html",
            DocumentKind::FullText => "pdf",
        }
    }

    /// Storage path of this document for a listing entry.
    ///
    /// `base/publisher/journal_shortname/{previews|fulltexts}/<doi with / as -->.{html|pdf}`
    pub fn target_path(&self, entry: &ListingEntry, base_dir: &Path) -> Option<PathBuf> {
        let stem = entry.file_stem()?;
        Some(
            base_dir
                .join(entry.publisher.id())
                .join(&entry.journal_shortname)
                .join(self.dir_name())
                .join(format!("{}.{}", stem, self.extension())),
        )
    }
}

/// A single file to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadJob {
    pub source_url: String,
    pub target_path: PathBuf,
}

impl DownloadJob {
    /// Create a job from explicit parts
    pub fn new(source_url: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            target_path: target_path.into(),
        }
    }

    /// Derive the job for one document of a listing entry.
    ///
    /// Returns `None` when the entry has no DOI or no URL for that document.
    pub fn from_entry(entry: &ListingEntry, kind: DocumentKind, base_dir: &Path) -> Option<Self> {
        let url = match kind {
            DocumentKind::Preview => Some(entry.preview_url.as_str()).filter(|u| !u.is_empty()),
            DocumentKind::FullText => entry.fulltext_url.as_deref(),
        }?;
        let target_path = kind.target_path(entry, base_dir)?;
        Some(Self::new(url, target_path))
    }
}

/// Result of processing one download job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub job: DownloadJob,
    pub downloaded: bool,
    pub message: String,

    /// HTTP status of the last response, if any was received
    pub status_code: Option<u16>,

    /// Number of fetch attempts made
    pub attempts: u32,
}

impl DownloadOutcome {
    /// The target already existed; nothing was fetched
    pub fn exists(job: DownloadJob) -> Self {
        Self {
            job,
            downloaded: false,
            message: "file exists".to_string(),
            status_code: None,
            attempts: 0,
        }
    }

    /// The document was saved
    pub fn saved(job: DownloadJob, message: &str, status: u16, attempts: u32) -> Self {
        Self {
            job,
            downloaded: true,
            message: message.to_string(),
            status_code: Some(status),
            attempts,
        }
    }

    /// The document could not be saved
    pub fn failed(
        job: DownloadJob,
        message: impl Into<String>,
        status_code: Option<u16>,
        attempts: u32,
    ) -> Self {
        Self {
            job,
            downloaded: false,
            message: message.into(),
            status_code,
            attempts,
        }
    }

    /// The job was past the scheduler's limit and never fetched
    pub fn not_scheduled(job: DownloadJob) -> Self {
        Self::failed(job, "not scheduled", None, 0)
    }

    /// Whether the target was already present
    pub fn was_existing(&self) -> bool {
        !self.downloaded && self.message == "file exists"
    }
}

/// Counts over a batch of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub existing: usize,
    pub failed: usize,
}

impl DownloadSummary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            if outcome.downloaded {
                summary.downloaded += 1;
            } else if outcome.was_existing() {
                summary.existing += 1;
            } else {
                summary.failed += 1;
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.existing + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Publisher;

    fn entry() -> ListingEntry {
        ListingEntry {
            publisher: Publisher::Nature,
            journal: "Nature Human Behaviour".to_string(),
            journal_shortname: "nathumbehav".to_string(),
            doi: Some("10.1038/s41562-019-0793-1".to_string()),
            title: "How people decide what they want to know".to_string(),
            year: 2020,
            preview_url: "https://www.nature.com/articles/s41562-019-0793-1".to_string(),
            fulltext_url: Some("https://www.nature.com/articles/s41562-019-0793-1.pdf".to_string()),
        }
    }

    #[test]
    fn test_job_paths_follow_layout() {
        let base = Path::new("files");

        let preview = DownloadJob::from_entry(&entry(), DocumentKind::Preview, base).unwrap();
        assert_eq!(
            preview.target_path,
            PathBuf::from("files/nature/nathumbehav/previews/10.1038--s41562-019-0793-1.html")
        );
        assert_eq!(preview.source_url, entry().preview_url);

        let fulltext = DownloadJob::from_entry(&entry(), DocumentKind::FullText, base).unwrap();
        assert_eq!(
            fulltext.target_path,
            PathBuf::from("files/nature/nathumbehav/fulltexts/10.1038--s41562-019-0793-1.pdf")
        );
    }

    #[test]
    fn test_job_requires_doi_and_url() {
        let mut no_pdf = entry();
        no_pdf.fulltext_url = None;
        assert!(DownloadJob::from_entry(&no_pdf, DocumentKind::FullText, Path::new("f")).is_none());

        let mut no_doi = entry();
        no_doi.doi = None;
        assert!(DownloadJob::from_entry(&no_doi, DocumentKind::Preview, Path::new("f")).is_none());
    }

    #[test]
    fn test_summary_counts() {
        let job = DownloadJob::new("http://x", "a.html");
        let outcomes = vec![
            DownloadOutcome::exists(job.clone()),
            DownloadOutcome::saved(job.clone(), "saved html", 200, 1),
            DownloadOutcome::failed(job, "too many retries", Some(503), 2),
        ];
        let summary = DownloadSummary::from_outcomes(&outcomes);
        assert_eq!(summary, DownloadSummary { downloaded: 1, existing: 1, failed: 1 });
        assert_eq!(summary.total(), 3);
    }
}
