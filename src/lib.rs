//! # Journal Harvester
//!
//! Harvests article metadata, landing pages and full texts from journal
//! publisher websites, and extracts authors, affiliations and email
//! addresses from the downloaded pages.
//!
//! ## Architecture
//!
//! The pipeline runs in three stages, each usable on its own:
//!
//! - [`sources`]: discovery. A [`sources::SearchProvider`] per publisher walks
//!   the listing pages of a journal, year by year, and yields [`models::ListingEntry`] records.
//! - [`download`]: acquisition. The [`download::DownloadScheduler`] fetches
//!   landing pages and PDFs concurrently into a fixed directory layout.
//! - [`parsers`]: extraction. [`parsers::parse`] turns a stored page into a
//!   [`models::Paper`] and its [`models::Author`]s; [`reconcile`] assigns
//!   loose email addresses to authors by name.
//!
//! Supporting modules:
//!
//! - [`models`]: Core data structures (ListingEntry, Paper, Author, DownloadJob, etc.)
//! - [`utils`]: HTTP fetching, retries, HTML helpers and PDF text extraction
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal progress indicators

pub mod config;
pub mod download;
pub mod models;
pub mod parsers;
pub mod reconcile;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Author, ListingEntry, Paper, Publisher};
pub use sources::{search_provider, SearchProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
