//! Listing entries produced by publisher searches.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Publishers with a listing-page search and a document parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Publisher {
    Elsevier,
    Springer,
    Wiley,
    TandF,
    Nature,
    Oxford,
    Cambridge,
}

impl Publisher {
    /// All supported publishers
    pub const ALL: [Publisher; 7] = [
        Publisher::Elsevier,
        Publisher::Springer,
        Publisher::Wiley,
        Publisher::TandF,
        Publisher::Nature,
        Publisher::Oxford,
        Publisher::Cambridge,
    ];

    /// Returns the publisher identifier, also used as the storage directory name
    pub fn id(&self) -> &'static str {
        match self {
            Publisher::Elsevier => "elsevier",
            Publisher::Springer => "springer",
            Publisher::Wiley => "wiley",
            Publisher::TandF => "tandf",
            Publisher::Nature => "nature",
            Publisher::Oxford => "oxford",
            Publisher::Cambridge => "cambridge",
        }
    }

    /// Returns the display name of the publisher
    pub fn name(&self) -> &'static str {
        match self {
            Publisher::Elsevier => "Elsevier",
            Publisher::Springer => "Springer",
            Publisher::Wiley => "Wiley",
            Publisher::TandF => "Taylor & Francis",
            Publisher::Nature => "Nature",
            Publisher::Oxford => "Oxford University Press",
            Publisher::Cambridge => "Cambridge University Press",
        }
    }
}

impl std::fmt::Display for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Publisher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Publisher::ALL
            .into_iter()
            .find(|p| p.id() == key)
            .ok_or_else(|| format!("unknown publisher '{}'", s))
    }
}

/// A single article found on a publisher's listing page
///
/// Entries are immutable once created. `doi` identifies the document within a
/// publisher and journal and is only missing for listings that do not expose it
/// before download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub publisher: Publisher,

    /// Journal name as printed by the publisher
    pub journal: String,

    /// Short name used for the storage directory
    pub journal_shortname: String,

    pub doi: Option<String>,

    pub title: String,

    /// Publication year, `0` when the listing does not show one
    pub year: i32,

    /// Article landing page
    pub preview_url: String,

    /// Direct PDF link, if the listing offers one
    pub fulltext_url: Option<String>,
}

impl ListingEntry {
    /// DOI in the form used for file names (`/` replaced by `--`)
    pub fn file_stem(&self) -> Option<String> {
        self.doi
            .as_deref()
            .filter(|doi| !doi.is_empty())
            .map(|doi| doi.replace('/', "--"))
    }
}

/// Parse the trailing four-digit year of a free-text date, e.g. "First published: 12 May 2020"
pub(crate) fn trailing_year(text: &str) -> i32 {
    let trimmed = text.trim();
    if trimmed.len() < 4 || !trimmed.is_char_boundary(trimmed.len() - 4) {
        return 0;
    }
    trimmed[trimmed.len() - 4..].parse().unwrap_or(0)
}

/// Parse the leading four-digit year of an ISO-like date, e.g. "2020-05-12"
pub(crate) fn leading_year(text: &str) -> i32 {
    text.trim()
        .get(..4)
        .and_then(|y| y.parse().ok())
        .unwrap_or(0)
}
