//! Paper and author records extracted from downloaded documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An author of a paper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name, e.g. "Jane Smith"
    pub name: String,

    /// Email addresses, deduplicated
    pub emails: BTreeSet<String>,

    /// Affiliation names in document order
    pub affiliations: Vec<String>,
}

impl Author {
    /// Create an author with a name and no emails or affiliations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an email address
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.emails.insert(email.into());
        self
    }

    /// Add an affiliation
    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliations.push(affiliation.into());
        self
    }
}

/// An affiliation declared once per document and referenced by id from authors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institution {
    pub ref_id: String,
    pub name: String,
}

/// Bibliographic record of one article
///
/// Text fields are empty when the publisher's markup omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub r#abstract: String,
    pub doi: String,
    pub volume: String,
    pub issue: String,
    pub start_page: String,
    pub end_page: String,

    /// Publication date as printed, e.g. "2020/05/12"
    pub date: String,

    /// Publication year, derived from `date` when possible
    pub year: String,

    /// First listed author
    pub primary_author: Option<Author>,
}

impl Paper {
    /// Create an empty paper for a DOI
    pub fn new(doi: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            ..Default::default()
        }
    }

    /// Set a text field unless it already holds a value.
    ///
    /// Returns true when the value was written.
    pub fn fill(slot: &mut String, value: &str) -> bool {
        let value = value.trim();
        if slot.is_empty() && !value.is_empty() {
            *slot = value.to_string();
            true
        } else {
            false
        }
    }

    /// Set the publication date and derive the year from its leading digits
    pub fn set_date(&mut self, date: &str) {
        if Self::fill(&mut self.date, date) {
            let year: String = self.date.chars().take(4).collect();
            if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
                self.year = year;
            }
        }
    }
}

/// Why a document was recognised as non-article content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Erratum, corrigendum, retraction or correction notice
    Correction(String),
    /// Cover pages, issue information, indexes and similar
    FrontMatter(String),
    /// Announcements, prizes, meeting minutes, editorials
    Announcement(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Correction(marker) => write!(f, "correction ({})", marker),
            SkipReason::FrontMatter(marker) => write!(f, "front or back matter ({})", marker),
            SkipReason::Announcement(marker) => write!(f, "announcement ({})", marker),
        }
    }
}

/// Outcome of parsing one downloaded document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub doi: Option<String>,
    pub paper: Option<Paper>,
    pub authors: Vec<Author>,

    /// Set when the document is not an article; `paper` and `authors` are then empty
    pub skipped: Option<SkipReason>,
}

impl ExtractionResult {
    /// A parsed article
    pub fn parsed(mut paper: Paper, authors: Vec<Author>) -> Self {
        if paper.primary_author.is_none() {
            paper.primary_author = authors.first().cloned();
        }
        Self {
            doi: Some(paper.doi.clone()).filter(|d| !d.is_empty()),
            paper: Some(paper),
            authors,
            skipped: None,
        }
    }

    /// A document recognised as non-article content
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    /// Whether the document was skipped
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Distinct affiliations across all authors
    pub fn institutions(&self) -> BTreeSet<&str> {
        self.authors
            .iter()
            .flat_map(|a| a.affiliations.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_never_overwrites() {
        let mut paper = Paper::new("10.1000/x");
        assert!(Paper::fill(&mut paper.title, "First title"));
        assert!(!Paper::fill(&mut paper.title, "Second title"));
        assert!(!Paper::fill(&mut paper.volume, "   "));
        assert_eq!(paper.title, "First title");
        assert!(paper.volume.is_empty());
    }

    #[test]
    fn test_set_date_derives_year() {
        let mut paper = Paper::default();
        paper.set_date("2020/05/12");
        assert_eq!(paper.year, "2020");

        let mut undated = Paper::default();
        undated.set_date("May 2020");
        assert_eq!(undated.date, "May 2020");
        assert!(undated.year.is_empty());
    }

    #[test]
    fn test_parsed_sets_primary_author() {
        let authors = vec![
            Author::new("Jane Smith").email("jane@uni.edu"),
            Author::new("Bob Jones"),
        ];
        let result = ExtractionResult::parsed(Paper::new("10.1/abc"), authors);

        assert_eq!(result.doi.as_deref(), Some("10.1/abc"));
        assert!(!result.is_skipped());
        assert_eq!(
            result.paper.unwrap().primary_author.unwrap().name,
            "Jane Smith"
        );
    }

    #[test]
    fn test_skipped_is_empty() {
        let result = ExtractionResult::skipped(SkipReason::Correction("Corrigendum".into()));
        assert!(result.is_skipped());
        assert!(result.paper.is_none());
        assert!(result.authors.is_empty());
    }

    #[test]
    fn test_institutions_are_distinct() {
        let result = ExtractionResult::parsed(
            Paper::new("10.1/abc"),
            vec![
                Author::new("A").affiliation("MIT").affiliation("NBER"),
                Author::new("B").affiliation("MIT"),
            ],
        );
        assert_eq!(result.institutions().into_iter().collect::<Vec<_>>(), vec!["MIT", "NBER"]);
    }
}
