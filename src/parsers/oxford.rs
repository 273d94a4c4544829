//! Oxford Academic article pages.
//!
//! Bibliographic data comes from the page's JSON-LD block. Pages without it
//! are usually the "Validate User" captcha served to automated clients.

use scraper::Html;
use serde_json::Value;

use super::{fill_from_meta, strip_prefix_or_keep, Document, ExtractError, Field};
use crate::models::{Author, ExtractionResult, Paper, Publisher};
use crate::utils::html::{first_attr, first_text, select_all, select_first, text_of};

const DOI_URL_PREFIX: &str = "https://dx.doi.org/";

/// Name parts this short are initials and are not required in correspondence text
const MIN_NAME_PART_LEN: usize = 3;

pub(super) fn parse(html: &Html, document: &Document) -> Result<ExtractionResult, ExtractError> {
    let root = html.root_element();
    let Some(script) = select_first(root, r#"script[type="application/ld+json"]"#) else {
        if first_text(root, "title").as_deref() == Some("Validate User") {
            tracing::warn!(
                "{} is a captcha page, download it again later",
                document.path.display()
            );
        }
        return Err(ExtractError::MarkupShape(
            "no JSON-LD block in article page".to_string(),
        ));
    };

    let data: Value = serde_json::from_str(&script.text().collect::<String>())?;
    // Some pages wrap the article object in an array
    let article = match &data {
        Value::Array(items) => items.first().ok_or_else(|| {
            ExtractError::MarkupShape("empty JSON-LD block in article page".to_string())
        })?,
        other => other,
    };

    let doi = article
        .get("url")
        .and_then(Value::as_str)
        .map(|url| strip_prefix_or_keep(url, DOI_URL_PREFIX).to_string())
        .filter(|doi| !doi.is_empty())
        .ok_or(ExtractError::MissingIdentifier {
            publisher: Publisher::Oxford,
            tag: "JSON-LD url",
        })?;

    let mut paper = Paper::new(doi);
    Paper::fill(&mut paper.title, &json_text(article, "name"));
    Paper::fill(&mut paper.start_page, &json_text(article, "pageStart"));
    Paper::fill(&mut paper.end_page, &json_text(article, "pageEnd"));
    paper.set_date(&json_text(article, "datePublished"));
    if let Some(section) = select_first(root, "section.abstract") {
        Paper::fill(&mut paper.r#abstract, &text_of(section));
    }
    fill_from_meta(
        html,
        &mut paper,
        &[
            ("citation_volume", Field::Volume),
            ("citation_issue", Field::Issue),
            ("citation_title", Field::Title),
            ("citation_publication_date", Field::Date),
        ],
    );

    let mut authors = authors(article);
    assign_correspondence(html, &mut authors);
    Ok(ExtractionResult::parsed(paper, authors))
}

/// A string or number field rendered as text
fn json_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn authors(article: &Value) -> Vec<Author> {
    let listed: &[Value] = match article.get("author") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(single @ Value::Object(_)) => std::slice::from_ref(single),
        _ => &[],
    };

    listed
        .iter()
        .filter_map(|person| {
            let name = display_name(person.get("name")?.as_str()?);
            if name.is_empty() {
                return None;
            }
            let mut author = Author::new(name);
            author.affiliations = affiliations(person.get("affiliation"));
            Some(author)
        })
        .collect()
}

/// "Last, First" to "First Last"
fn display_name(listed: &str) -> String {
    let parts: Vec<&str> = listed.split(',').map(str::trim).rev().collect();
    parts.join(" ").trim().to_string()
}

fn affiliations(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Object(_)) => affiliations(value.and_then(|v| v.get("name"))),
        Some(Value::Array(items)) => items.iter().flat_map(|v| affiliations(Some(v))).collect(),
        _ => Vec::new(),
    }
}

/// Correspondence blocks name their author in free text; a block belongs to
/// the author whose name parts all appear in it.
fn assign_correspondence(html: &Html, authors: &mut [Author]) {
    let blocks = select_all(html.root_element(), "div.info-author-correspondence");
    if blocks.is_empty() {
        return;
    }

    for author in authors.iter_mut() {
        let parts: Vec<&str> = author
            .name
            .split_whitespace()
            .filter(|p| p.chars().count() >= MIN_NAME_PART_LEN)
            .collect();
        if parts.is_empty() {
            continue;
        }

        for block in &blocks {
            let text = text_of(*block);
            if !parts.iter().all(|part| text.contains(part)) {
                continue;
            }
            if let Some(href) = first_attr(*block, "a", "href") {
                let email = strip_prefix_or_keep(&href, "mailto:");
                if !email.is_empty() {
                    author.emails.insert(email.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse;

    const ARTICLE: &str = r#"<html><head>
        <title>Market Design | The Review of Economic Studies | Oxford Academic</title>
        <meta name="citation_volume" content="87">
        <meta name="citation_issue" content="4">
        <script type="application/ld+json">{
            "@type": "ScholarlyArticle",
            "name": "Market Design for School Choice",
            "url": "https://dx.doi.org/10.1093/restud/rdz047",
            "datePublished": "2020-07-01",
            "pageStart": 1620,
            "pageEnd": "1660",
            "author": [
                {"name": "Abdulkadiroglu, Atila", "affiliation": "Duke University"},
                {"name": "Che, Yeon-Koo"}
            ]
        }</script>
        </head><body>
        <section class="abstract"><p>We study  school choice.</p></section>
        <div class="info-author-correspondence">Correspondence: Atila Abdulkadiroglu,
            <a href="mailto:atila@duke.edu">atila@duke.edu</a></div>
        </body></html>"#;

    #[test]
    fn test_parse_article() {
        let result = parse(Publisher::Oxford, &Document::from_html("o.html", ARTICLE)).unwrap();

        let paper = result.paper.unwrap();
        assert_eq!(paper.doi, "10.1093/restud/rdz047");
        assert_eq!(paper.title, "Market Design for School Choice");
        assert_eq!(paper.start_page, "1620");
        assert_eq!(paper.end_page, "1660");
        assert_eq!(paper.volume, "87");
        assert_eq!(paper.year, "2020");
        assert_eq!(paper.r#abstract, "We study school choice.");

        assert_eq!(result.authors[0].name, "Atila Abdulkadiroglu");
        assert_eq!(result.authors[0].affiliations, vec!["Duke University"]);
        assert!(result.authors[0].emails.contains("atila@duke.edu"));
        assert_eq!(result.authors[1].name, "Yeon-Koo Che");
        assert!(result.authors[1].emails.is_empty());
    }

    #[test]
    fn test_captcha_page_is_markup_error() {
        let document = Document::from_html(
            "captcha.html",
            "<html><head><title>Validate User</title></head><body></body></html>",
        );
        assert!(matches!(
            parse(Publisher::Oxford, &document),
            Err(ExtractError::MarkupShape(_))
        ));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Che, Yeon-Koo"), "Yeon-Koo Che");
        assert_eq!(display_name("Plato"), "Plato");
    }
}
