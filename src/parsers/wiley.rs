//! Wiley Online Library article pages.

use scraper::{ElementRef, Html};

use super::{fill_from_meta, strip_prefix_or_keep, Document, ExtractError, CITATION_TAGS};
use crate::models::{Author, ExtractionResult, Paper, Publisher, SkipReason};
use crate::utils::html::{first_text, meta_content, meta_property, select_all, select_first, text_of};

/// Markers anywhere in the page identifying corrections
const CORRECTION_MARKERS: &[&str] = &["ERRATUM", "RETRACTION", "CORRIGENDUM", "Errata"];

/// Markers anywhere in the page identifying prizes and editorials
const NOTICE_MARKERS: &[&str] = &["FELLOW OF THE YEAR", "AWARDS AND PRIZES", "EDITORIAL"];

/// Title fragments of issue furniture and society business, compared case-insensitively
const FRONT_MATTER_TITLES: &[&str] = &[
    "Cover Image",
    "Issue Information",
    "CORRIGENDUM",
    "Report of the",
    "BRATTLE GROUP PRIZES",
    "AMERICAN FINANCE ASSOCIATION",
    "Participant Schedule",
    "DIMENSIONAL FUND ADVISORS PRIZES",
    "Minutes of the",
    "Call for Papers",
    "AUTHOR INDEX",
    "List of Reviewers",
    "Accepted Articles",
    "Content:",
    "Back Matter",
    "Front Matter",
    "Volume Information",
    "ANNOUNCEMENT",
    "ASSOCIATION MEETINGS",
    "From the ExSec's Notebook",
    "Participants in the AFA Program",
    "ANNUAL MEETING",
];

/// Whole titles of announcement pages
const ANNOUNCEMENT_TITLES: &[&str] = &["ANNOUNCEMENTS", "MISCELLANEA"];

pub(super) fn parse(html: &Html, document: &Document) -> Result<ExtractionResult, ExtractError> {
    if let Some(reason) = classify(html, &document.html) {
        return Ok(ExtractionResult::skipped(reason));
    }

    let doi = meta_content(html, "dc.identifier").ok_or(ExtractError::MissingIdentifier {
        publisher: Publisher::Wiley,
        tag: "dc.identifier meta tag",
    })?;

    let mut paper = Paper::new(doi);
    fill_from_meta(html, &mut paper, CITATION_TAGS);
    let root = html.root_element();
    if let Some(text) = first_text(root, "div.abstract-group p")
        .or_else(|| first_text(root, "div.article-section__content p"))
    {
        Paper::fill(&mut paper.r#abstract, &text);
    }

    Ok(ExtractionResult::parsed(paper, authors(html)))
}

fn classify(html: &Html, raw: &str) -> Option<SkipReason> {
    if let Some(marker) = CORRECTION_MARKERS.iter().find(|m| raw.contains(*m)) {
        return Some(SkipReason::Correction(marker.to_string()));
    }
    if let Some(marker) = NOTICE_MARKERS.iter().find(|m| raw.contains(*m)) {
        return Some(SkipReason::Announcement(marker.to_string()));
    }

    let title = meta_property(html, "og:title").unwrap_or_default();
    // Exact titles first: "ANNOUNCEMENTS" also contains a front-matter marker.
    if ANNOUNCEMENT_TITLES.contains(&title.as_str()) {
        return Some(SkipReason::Announcement(title));
    }
    let lower = title.to_lowercase();
    if FRONT_MATTER_TITLES
        .iter()
        .any(|marker| lower.contains(&marker.to_lowercase()))
    {
        return Some(SkipReason::FrontMatter(title));
    }
    None
}

fn authors(html: &Html) -> Vec<Author> {
    let Some(list) = select_first(html.root_element(), "div.loa-authors") else {
        return Vec::new();
    };
    let mut tabs = select_all(list, "div.accordion-tabbed__tab-mobile");
    if tabs.is_empty() {
        tabs = select_all(list, "span.accordion-tabbed__tab-mobile");
    }
    tabs.into_iter().filter_map(author).collect()
}

fn author(tab: ElementRef<'_>) -> Option<Author> {
    let name = first_text(tab, "a span").filter(|n| !n.is_empty())?;
    let mut author = Author::new(name);

    let Some(details) = select_first(tab, "div") else {
        return Some(author);
    };

    for link in select_all(details, "ul.sm-account li a") {
        let href = link.value().attr("href").unwrap_or_default();
        if !href.contains("mailto:") {
            continue;
        }
        let email = first_text(link, "span")
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| strip_prefix_or_keep(href, "mailto:").to_string());
        author.emails.insert(email);
    }

    for para in select_all(details, "p") {
        if para.value().attr("class").is_some() {
            continue;
        }
        match first_text(para, "b") {
            None => {
                let text = text_of(para);
                if !text.is_empty() {
                    author.affiliations.push(text);
                }
            }
            Some(heading) if heading.starts_with("Correspondence") => break,
            Some(_) => {}
        }
    }
    Some(author)
}
