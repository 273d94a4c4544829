//! Cambridge Core article pages.

use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use std::collections::BTreeSet;

use super::{fill_from_meta, strip_prefix_or_keep, Document, ExtractError, Field};
use crate::models::{Author, ExtractionResult, Paper, Publisher, SkipReason};
use crate::reconcile::{first_email, match_emails};
use crate::utils::collapse_whitespace;
use crate::utils::html::{first_text, meta_content, meta_property, select_all, select_first, text_of};

const CORRECTION_MARKERS: &[&str] = &["ERRATUM", "CORRIGENDUM"];

const PAPER_TAGS: &[(&str, Field)] = &[
    ("citation_title", Field::Title),
    ("citation_abstract", Field::Abstract),
    ("citation_volume", Field::Volume),
    ("citation_issue", Field::Issue),
    ("citation_firstpage", Field::StartPage),
    ("citation_lastpage", Field::EndPage),
    ("citation_publication_date", Field::Date),
];

pub(super) fn parse(html: &Html, _document: &Document) -> Result<ExtractionResult, ExtractError> {
    if let Some(title) = meta_property(html, "og:title") {
        let upper = title.to_uppercase();
        if CORRECTION_MARKERS.iter().any(|m| upper.contains(m)) {
            return Ok(ExtractionResult::skipped(SkipReason::Correction(title)));
        }
    }

    let doi = meta_content(html, "citation_doi").ok_or(ExtractError::MissingIdentifier {
        publisher: Publisher::Cambridge,
        tag: "citation_doi meta tag",
    })?;

    let mut paper = Paper::new(doi);
    if let Some(date) = first_text(html.root_element(), "div.row.published-date strong") {
        paper.set_date(&format_published_date(&date));
    }
    fill_from_meta(html, &mut paper, PAPER_TAGS);

    Ok(ExtractionResult::parsed(paper, authors(html)))
}

/// "12 May 2020" to "2020/05/12"; anything else gives an empty date
fn format_published_date(printed: &str) -> String {
    match NaiveDate::parse_from_str(printed.trim(), "%d %B %Y") {
        Ok(date) => date.format("%Y/%m/%d").to_string(),
        Err(e) => {
            tracing::debug!("Unparseable published date '{}': {}", printed, e);
            String::new()
        }
    }
}

fn authors(html: &Html) -> Vec<Author> {
    let Some(details) = select_first(html.root_element(), "div.contributors-details") else {
        return Vec::new();
    };

    let detailed: Vec<Author> = select_all(details, "dl#authors-details div.row.author")
        .into_iter()
        .filter_map(detailed_author)
        .collect();
    if !detailed.is_empty() {
        return detailed;
    }

    // Without the details list only names and correspondence addresses are shown
    let mut authors: Vec<Author> = select_all(details, "div.contributor a")
        .into_iter()
        .map(text_of)
        .filter(|name| !name.is_empty())
        .map(Author::new)
        .collect();
    if authors.is_empty() {
        authors = select_all(details, "div.contributor-type__contributor span")
            .into_iter()
            .map(text_of)
            .filter(|name| !name.is_empty())
            .map(Author::new)
            .collect();
    }

    let emails: BTreeSet<String> = select_all(details, "div.corresp a")
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("mailto:"))
        .map(|href| strip_prefix_or_keep(href, "mailto:").to_string())
        .collect();
    match_emails(&emails, &mut authors);
    authors
}

/// An author row: the name, then one line of comma separated affiliation
/// pieces that repeats the name and may contain the email address.
fn detailed_author(row: ElementRef<'_>) -> Option<Author> {
    let name = collapse_whitespace(row.value().attr("data-test-author")?);
    if name.is_empty() {
        return None;
    }
    let mut author = Author::new(name.clone());

    let content = first_text(row, "dd.content div span").unwrap_or_default();
    let name_parts: Vec<&str> = name.split(' ').collect();
    let mut remainder = content
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty() && *piece != name && !name_parts.contains(piece))
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(email) = first_email(&remainder) {
        remainder = remainder.replace(&email, "");
        author.emails.insert(email);
    }
    let affiliation = collapse_whitespace(&remainder);
    if !affiliation.is_empty() {
        author.affiliations.push(affiliation);
    }
    Some(author)
}
