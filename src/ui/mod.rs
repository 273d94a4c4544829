//! Terminal progress indicators for the command-line tool.
//!
//! Indicators draw only when stderr is a terminal, so piped JSON output
//! stays clean.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{DownloadOutcome, DownloadSummary};

/// Check if stderr is a terminal.
pub fn is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

fn style(template: &str, ticks: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(ticks)
}

/// Marker for one download outcome
pub fn outcome_icon(outcome: &DownloadOutcome) -> &'static str {
    if outcome.downloaded {
        "✓"
    } else if outcome.was_existing() {
        "="
    } else {
        "✗"
    }
}

/// A loading spinner with a message.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = if is_terminal() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }
}

/// Progress bar over a batch of download jobs
pub struct DownloadProgress {
    pb: ProgressBar,
}

impl DownloadProgress {
    pub fn new(total: usize) -> Self {
        let pb = if is_terminal() {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {wide_bar:.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█  "),
        );
        Self { pb }
    }

    /// Advance by one finished job
    pub fn record(&self, outcome: &DownloadOutcome) {
        self.pb.inc(1);
        self.pb.set_message(format!(
            "{} {}",
            outcome_icon(outcome),
            outcome.job.target_path.display()
        ));
    }

    /// Finish with the batch counts
    pub fn finish(&self, summary: &DownloadSummary) {
        self.pb.finish_with_message(format!(
            "{} downloaded, {} existing, {} failed",
            summary.downloaded, summary.existing, summary.failed
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DownloadJob;

    #[test]
    fn test_outcome_icons() {
        let job = DownloadJob::new("https://x.test/a.pdf", "a.pdf");
        assert_eq!(outcome_icon(&DownloadOutcome::exists(job.clone())), "=");
        assert_eq!(outcome_icon(&DownloadOutcome::saved(job.clone(), "saved binary", 200, 1)), "✓");
        assert_eq!(
            outcome_icon(&DownloadOutcome::failed(job, "too many retries", Some(503), 2)),
            "✗"
        );
    }
}
