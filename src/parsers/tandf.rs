//! Taylor & Francis Online article pages.

use scraper::{ElementRef, Html};

use super::{fill_from_meta, Document, ExtractError, Field, CITATION_TAGS};
use crate::models::{Author, ExtractionResult, Paper, Publisher};
use crate::utils::collapse_whitespace;
use crate::utils::html::{first_attr, first_text, select_all, select_first};

const PAPER_TAGS: &[(&str, Field)] = &[
    ("dc.Title", Field::Title),
    ("dc.Description", Field::Abstract),
    ("dc.Date", Field::Date),
];

pub(super) fn parse(html: &Html, _document: &Document) -> Result<ExtractionResult, ExtractError> {
    let doi = first_attr(
        html.root_element(),
        r#"meta[name="dc.Identifier"][scheme="doi"]"#,
        "content",
    )
    .map(|doi| doi.trim().to_string())
    .filter(|doi| !doi.is_empty())
    .ok_or(ExtractError::MissingIdentifier {
        publisher: Publisher::TandF,
        tag: "dc.Identifier DOI meta tag",
    })?;

    let mut paper = Paper::new(doi);
    fill_from_meta(html, &mut paper, PAPER_TAGS);
    fill_from_meta(html, &mut paper, CITATION_TAGS);

    let authors = select_all(html.root_element(), "span.contribDegrees")
        .into_iter()
        .filter_map(author)
        .collect();
    Ok(ExtractionResult::parsed(paper, authors))
}

/// The name is the first text of the author link; the link also holds an
/// overlay listing affiliations separated by semicolons.
fn author(contributor: ElementRef<'_>) -> Option<Author> {
    let link = select_first(contributor, "a")?;
    let name = collapse_whitespace(link.text().next().unwrap_or_default());
    if name.is_empty() {
        return None;
    }
    let mut author = Author::new(name);

    if let Some(overlay) = select_first(link, "span.overlay") {
        let listed = overlay.text().next().unwrap_or_default();
        author.affiliations.extend(
            listed
                .split(';')
                .map(collapse_whitespace)
                .filter(|a| !a.is_empty()),
        );
    }

    if let Some(email) = first_text(contributor, "span.corr-email span").filter(|e| !e.is_empty()) {
        author.emails.insert(email);
    }
    Some(author)
}
