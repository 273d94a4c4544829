//! SpringerLink article pages.

use scraper::Html;

use super::{fill_from_meta, meta_sequence, strip_prefix_or_keep, Document, ExtractError, Field, CITATION_TAGS};
use crate::models::{Author, ExtractionResult, Paper, Publisher, SkipReason};
use crate::utils::html::{first_attr, meta_content};

const DOI_LINK: &str =
    "li.c-bibliographic-information__list-item--doi span.c-bibliographic-information__value a";

const PAPER_TAGS: &[(&str, Field)] = &[
    ("dc.title", Field::Title),
    ("dc.description", Field::Abstract),
    ("prism.volume", Field::Volume),
    ("prism.number", Field::Issue),
    ("prism.startingPage", Field::StartPage),
    ("prism.endingPage", Field::EndPage),
    ("prism.publicationDate", Field::Date),
];

pub(super) fn parse(html: &Html, _document: &Document) -> Result<ExtractionResult, ExtractError> {
    if let Some(kind) = meta_content(html, "dc.type") {
        if kind.to_lowercase().contains("announcement") {
            return Ok(ExtractionResult::skipped(SkipReason::Announcement(kind)));
        }
    }

    let doi = meta_content(html, "DOI")
        .or_else(|| {
            first_attr(html.root_element(), DOI_LINK, "href")
                .map(|href| strip_prefix_or_keep(&href, "https://doi.org/").to_string())
        })
        .filter(|doi| !doi.is_empty())
        .ok_or(ExtractError::MissingIdentifier {
            publisher: Publisher::Springer,
            tag: "DOI meta tag or link",
        })?;

    let mut paper = Paper::new(doi);
    fill_from_meta(html, &mut paper, PAPER_TAGS);
    fill_from_meta(html, &mut paper, CITATION_TAGS);

    Ok(ExtractionResult::parsed(paper, authors(html)))
}

/// Authors from the `citation_author` tags, each followed by its own email and institution tags
fn authors(html: &Html) -> Vec<Author> {
    let tags = meta_sequence(
        html,
        &[
            "citation_author",
            "citation_author_email",
            "citation_author_institution",
        ],
    );

    let mut authors: Vec<Author> = Vec::new();
    for (name, content) in tags {
        if content.is_empty() {
            continue;
        }
        match (name.as_str(), authors.last_mut()) {
            ("citation_author", _) => authors.push(Author::new(content)),
            ("citation_author_email", Some(author)) => {
                author.emails.insert(content);
            }
            ("citation_author_institution", Some(author)) => author.affiliations.push(content),
            _ => tracing::debug!("Ignoring {} before the first author", name),
        }
    }
    authors
}
