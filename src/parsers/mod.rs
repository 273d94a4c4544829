//! Extraction of papers and authors from downloaded article pages.
//!
//! Every publisher lays out its landing pages differently, so each has its
//! own parser module. [`parse`] dispatches on the publisher and returns an
//! [`ExtractionResult`]: either a parsed paper with its authors, or a skip
//! marker for pages that are not research articles (corrections, cover
//! pages, announcements). Only a missing DOI or a page whose structure is
//! unusable is an error; any other missing field is left empty.

mod cambridge;
mod elsevier;
mod nature;
mod oxford;
mod springer;
mod tandf;
mod wiley;

use scraper::Html;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{DocumentKind, ExtractionResult, ListingEntry, Paper, Publisher, SkipReason};
use crate::sources::is_excluded_title;
use crate::utils::html::{first_text, meta_content, meta_property, select_all};
use crate::utils::{extract_text_if_present, strip_html};

/// Title fragments marking a correction notice wherever they appear
const CORRECTION_MARKERS: &[&str] = &["corrigendum", "erratum"];

/// Errors raised while extracting a document
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{publisher} document has no {tag}")]
    MissingIdentifier {
        publisher: Publisher,
        tag: &'static str,
    },

    #[error("Unexpected markup: {0}")]
    MarkupShape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Full text accompanying an article page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FullText {
    #[default]
    None,
    /// Text already extracted
    Text(String),
    /// A PDF whose text is extracted on first use
    Pdf(PathBuf),
}

impl FullText {
    /// The full text, extracting it from the PDF if needed
    pub fn text(&self) -> Option<String> {
        match self {
            FullText::None => None,
            FullText::Text(text) => Some(text.clone()),
            FullText::Pdf(path) => extract_text_if_present(path),
        }
    }
}

/// A downloaded article page, with its full text when one was downloaded
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub html: String,
    pub fulltext: FullText,
}

impl Document {
    /// Wrap markup that is already in memory
    pub fn from_html(path: impl Into<PathBuf>, html: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            html: html.into(),
            fulltext: FullText::None,
        }
    }

    /// Attach a full text
    pub fn with_fulltext(mut self, fulltext: FullText) -> Self {
        self.fulltext = fulltext;
        self
    }

    /// Read a preview page from disk, picking up the sibling full-text PDF if present
    pub fn read(path: &Path) -> Result<Self, ExtractError> {
        let html = std::fs::read_to_string(path)?;
        let fulltext = match fulltext_path(path) {
            Some(pdf) if pdf.is_file() => FullText::Pdf(pdf),
            _ => FullText::None,
        };
        Ok(Self {
            path: path.to_path_buf(),
            html,
            fulltext,
        })
    }

    /// Read the stored preview page of a listing entry
    pub fn load(entry: &ListingEntry, base_dir: &Path) -> Result<Self, ExtractError> {
        let path = DocumentKind::Preview.target_path(entry, base_dir).ok_or(
            ExtractError::MissingIdentifier {
                publisher: entry.publisher,
                tag: "listing DOI",
            },
        )?;
        Self::read(&path)
    }
}

/// `.../previews/<stem>.html` maps to `.../fulltexts/<stem>.pdf`
pub fn fulltext_path(preview: &Path) -> Option<PathBuf> {
    let stem = preview.file_stem()?.to_str()?;
    let journal_dir = preview.parent()?.parent()?;
    Some(journal_dir.join(DocumentKind::FullText.dir_name()).join(format!(
        "{}.{}",
        stem,
        DocumentKind::FullText.extension()
    )))
}

/// Extract the paper and authors of a document
pub fn parse(publisher: Publisher, document: &Document) -> Result<ExtractionResult, ExtractError> {
    let html = Html::parse_document(&document.html);

    if let Some(reason) = correction_notice(&html) {
        tracing::info!("Skipping {}: {}", document.path.display(), reason);
        return Ok(ExtractionResult::skipped(reason));
    }

    let result = match publisher {
        Publisher::Elsevier => elsevier::parse(&html, document),
        Publisher::Springer => springer::parse(&html, document),
        Publisher::Wiley => wiley::parse(&html, document),
        Publisher::TandF => tandf::parse(&html, document),
        Publisher::Nature => nature::parse(&html, document),
        Publisher::Oxford => oxford::parse(&html, document),
        Publisher::Cambridge => cambridge::parse(&html, document),
    }?;

    match &result.skipped {
        Some(reason) => tracing::info!("Skipping {}: {}", document.path.display(), reason),
        None => tracing::debug!(
            "Parsed {} with {} authors",
            document.path.display(),
            result.authors.len()
        ),
    }
    Ok(result)
}

/// Load and parse the stored preview page of a listing entry
pub fn parse_entry(entry: &ListingEntry, base_dir: &Path) -> Result<ExtractionResult, ExtractError> {
    let document = Document::load(entry, base_dir)?;
    parse(entry.publisher, &document)
}

/// Best available article title of a page
fn page_title(html: &Html) -> Option<String> {
    meta_property(html, "og:title")
        .or_else(|| meta_content(html, "citation_title"))
        .or_else(|| meta_content(html, "dc.title"))
        .or_else(|| first_text(html.root_element(), "title"))
}

fn correction_notice(html: &Html) -> Option<SkipReason> {
    let title = page_title(html)?;
    let lower = title.to_lowercase();
    let marked = CORRECTION_MARKERS.iter().any(|m| lower.contains(m));
    (marked || is_excluded_title(&title)).then(|| SkipReason::Correction(title))
}

/// A paper field that publishers expose as a meta tag
#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Abstract,
    Volume,
    Issue,
    StartPage,
    EndPage,
    Date,
}

/// Fill paper fields from meta tags.
///
/// Tags are tried in the order given; a field set by an earlier tag keeps its value.
fn fill_from_meta(html: &Html, paper: &mut Paper, tags: &[(&str, Field)]) {
    for (name, field) in tags {
        if let Some(value) = meta_content(html, name) {
            fill_field(paper, *field, &value);
        }
    }
}

fn fill_field(paper: &mut Paper, field: Field, value: &str) {
    match field {
        Field::Title => {
            Paper::fill(&mut paper.title, value);
        }
        Field::Abstract => {
            Paper::fill(&mut paper.r#abstract, &strip_html(value));
        }
        Field::Volume => {
            Paper::fill(&mut paper.volume, value);
        }
        Field::Issue => {
            Paper::fill(&mut paper.issue, value);
        }
        Field::StartPage => {
            Paper::fill(&mut paper.start_page, value);
        }
        Field::EndPage => {
            Paper::fill(&mut paper.end_page, value);
        }
        Field::Date => paper.set_date(value),
    }
}

/// The usual Highwire `citation_*` tags
const CITATION_TAGS: &[(&str, Field)] = &[
    ("citation_title", Field::Title),
    ("citation_volume", Field::Volume),
    ("citation_issue", Field::Issue),
    ("citation_firstpage", Field::StartPage),
    ("citation_lastpage", Field::EndPage),
    ("citation_publication_date", Field::Date),
    ("citation_date", Field::Date),
];

/// `(name, content)` of the meta tags with one of `names`, in document order
fn meta_sequence(html: &Html, names: &[&str]) -> Vec<(String, String)> {
    select_all(html.root_element(), "meta[name]")
        .into_iter()
        .filter_map(|meta| {
            let name = meta.value().attr("name")?;
            let content = meta.value().attr("content")?.trim();
            names
                .contains(&name)
                .then(|| (name.to_string(), content.to_string()))
        })
        .collect()
}

/// Drop a URL scheme prefix such as `mailto:` or `https://doi.org/`
fn strip_prefix_or_keep<'a>(value: &'a str, prefix: &str) -> &'a str {
    value.trim().strip_prefix(prefix).unwrap_or(value.trim())
}
