//! Core data models shared by every publisher: listing entries, papers, authors,
//! search queries and download jobs.

mod download;
mod listing;
mod paper;
mod search;

pub use download::{DocumentKind, DownloadJob, DownloadOutcome, DownloadSummary};
pub use listing::{ListingEntry, Publisher};
pub(crate) use listing::{leading_year, trailing_year};
pub use paper::{Author, ExtractionResult, Institution, Paper, SkipReason};
pub use search::{ListingQuery, SearchSettings};
