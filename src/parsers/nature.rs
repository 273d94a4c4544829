//! nature.com article pages.
//!
//! Nature pages list authors and institutions but no email addresses, so
//! those are collected from the downloaded PDF and assigned by name.

use scraper::Html;

use super::{fill_from_meta, meta_sequence, Document, ExtractError, Field, CITATION_TAGS};
use crate::models::{Author, ExtractionResult, Paper, Publisher};
use crate::reconcile::{find_emails, match_emails};
use crate::utils::html::meta_content;

const PAPER_TAGS: &[(&str, Field)] = &[
    ("dc.title", Field::Title),
    ("dc.description", Field::Abstract),
    ("dc.date", Field::Date),
];

pub(super) fn parse(html: &Html, document: &Document) -> Result<ExtractionResult, ExtractError> {
    let doi = meta_content(html, "DOI").ok_or(ExtractError::MissingIdentifier {
        publisher: Publisher::Nature,
        tag: "DOI meta tag",
    })?;

    let mut paper = Paper::new(doi);
    fill_from_meta(html, &mut paper, CITATION_TAGS);
    fill_from_meta(html, &mut paper, PAPER_TAGS);

    let mut authors = authors(html);
    match document.fulltext.text() {
        Some(text) => {
            let emails = find_emails(&text);
            let assigned = match_emails(&emails, &mut authors);
            tracing::debug!(
                "Assigned {} of {} full-text emails for {}",
                assigned,
                emails.len(),
                paper.doi
            );
        }
        None => tracing::debug!("No full text for {}, emails stay empty", paper.doi),
    }

    Ok(ExtractionResult::parsed(paper, authors))
}

fn authors(html: &Html) -> Vec<Author> {
    let mut authors: Vec<Author> = Vec::new();
    for (name, content) in meta_sequence(html, &["citation_author", "citation_author_institution"]) {
        if content.is_empty() {
            continue;
        }
        if name == "citation_author" {
            authors.push(Author::new(content));
        } else if let Some(author) = authors.last_mut() {
            author.affiliations.push(content);
        }
    }
    authors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{parse, FullText};

    const ARTICLE: &str = r#"<html><head>
        <meta name="DOI" content="10.1038/s41562-020-0845-6">
        <meta name="citation_title" content="Cooperation across cultures">
        <meta name="dc.description" content="A large-scale study.">
        <meta name="citation_volume" content="4">
        <meta name="citation_issue" content="6">
        <meta name="citation_publication_date" content="2020/06/15">
        <meta name="citation_author" content="Sofía Martínez">
        <meta name="citation_author_institution" content="Universidad Carlos III de Madrid">
        <meta name="citation_author" content="Erik Lindqvist">
        <meta name="citation_author_institution" content="Stockholm University">
        <meta name="citation_author_institution" content="IFN">
        </head><body></body></html>"#;

    #[test]
    fn test_emails_come_from_fulltext() {
        let text = "Correspondence and requests for materials should be addressed to \
                    S.M. (sofia.martinez@uc3m.es) or E.L. (erik.lindqvist@su.se).";
        let document = Document::from_html("n.html", ARTICLE).with_fulltext(FullText::Text(text.to_string()));

        let result = parse(Publisher::Nature, &document).unwrap();
        assert_eq!(result.authors.len(), 2);
        assert!(result.authors[0].emails.contains("sofia.martinez@uc3m.es"));
        assert!(result.authors[1].emails.contains("erik.lindqvist@su.se"));
        assert_eq!(result.authors[1].affiliations, vec!["Stockholm University", "IFN"]);

        let paper = result.paper.unwrap();
        assert_eq!(paper.r#abstract, "A large-scale study.");
        assert_eq!(paper.issue, "6");
        assert_eq!(paper.primary_author.unwrap().name, "Sofía Martínez");
    }

    #[test]
    fn test_without_fulltext_emails_stay_empty() {
        let result = parse(Publisher::Nature, &Document::from_html("n.html", ARTICLE)).unwrap();
        assert!(result.authors.iter().all(|a| a.emails.is_empty()));
    }
}
