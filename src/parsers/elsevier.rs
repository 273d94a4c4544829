//! ScienceDirect article pages.
//!
//! The page embeds its article data as a JSON document in a script tag. The
//! JSON mirrors Elsevier's XML: every node has a `#name`, attributes under
//! `$`, text under `_` and children under `$$`.

use scraper::Html;
use serde_json::Value;

use super::{fill_from_meta, strip_prefix_or_keep, Document, ExtractError, CITATION_TAGS};
use crate::models::{Author, ExtractionResult, Institution, Paper, Publisher};
use crate::utils::html::{meta_content, select_first};

const DATA_SCRIPT: &str = r#"script[type="application/json"][data-iso-key="_0"]"#;
const HIGHLIGHT_TITLES: &[&str] = &["Highlights", "Highlight"];

/// Ways an abstract is laid out, tried in order
const ABSTRACT_MATCHERS: &[fn(&[Value]) -> Option<String>] = &[highlights_layout, plain_layout];

pub(super) fn parse(html: &Html, _document: &Document) -> Result<ExtractionResult, ExtractError> {
    let doi = meta_content(html, "dc.identifier").ok_or(ExtractError::MissingIdentifier {
        publisher: Publisher::Elsevier,
        tag: "dc.identifier meta tag",
    })?;

    let script = select_first(html.root_element(), DATA_SCRIPT)
        .ok_or_else(|| ExtractError::MarkupShape("no embedded article JSON".to_string()))?;
    let data: Value = serde_json::from_str(&script.text().collect::<String>())?;

    let mut paper = Paper::new(doi);
    fill_from_meta(html, &mut paper, CITATION_TAGS);
    paper.r#abstract = abstract_text(&data);

    Ok(ExtractionResult::parsed(paper, authors(&data)))
}

fn children(node: &Value) -> &[Value] {
    node.get("$$")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn node_name(node: &Value) -> &str {
    node.get("#name").and_then(Value::as_str).unwrap_or_default()
}

fn node_text(node: &Value) -> Option<&str> {
    node.get("_").and_then(Value::as_str)
}

fn attr<'a>(node: &'a Value, name: &str) -> Option<&'a str> {
    node.get("$").and_then(|a| a.get(name)).and_then(Value::as_str)
}

/// Author with the affiliation ids it references
struct AuthorNode {
    author: Author,
    ref_ids: Vec<String>,
}

fn authors(data: &Value) -> Vec<Author> {
    let group = data
        .pointer("/authors/content/0")
        .map(children)
        .unwrap_or_default();

    let mut nodes = Vec::new();
    let mut institutions = Vec::new();
    for node in group {
        match node_name(node) {
            "author" => nodes.push(author_node(node)),
            "affiliation" => institutions.extend(institution(node)),
            _ => {}
        }
    }

    let mut authors: Vec<Author> = nodes
        .into_iter()
        .map(|mut node| {
            node.author.affiliations = institutions
                .iter()
                .filter(|i| node.ref_ids.contains(&i.ref_id))
                .map(|i| i.name.clone())
                .collect();
            node.author
        })
        .collect();

    // Single-affiliation articles often omit the cross references entirely
    if authors.iter().all(|a| a.affiliations.is_empty()) {
        let names: Vec<String> = institutions.into_iter().map(|i| i.name).collect();
        for author in &mut authors {
            author.affiliations = names.clone();
        }
    }
    authors
}

fn author_node(node: &Value) -> AuthorNode {
    let mut given = "";
    let mut surname = "";
    let mut emails = Vec::new();
    let mut ref_ids = Vec::new();

    for prop in children(node) {
        match node_name(prop) {
            "given-name" => given = node_text(prop).unwrap_or_default(),
            "surname" => {
                surname = node_text(prop)
                    .or_else(|| children(prop).first().and_then(node_text))
                    .unwrap_or_default()
            }
            "cross-ref" => {
                if let Some(refid) = attr(prop, "refid") {
                    ref_ids.extend(refid.split_whitespace().map(str::to_string));
                }
            }
            "e-address" if attr(prop, "type") == Some("email") => {
                let email = node_text(prop)
                    .or_else(|| attr(prop, "href"))
                    .map(|e| strip_prefix_or_keep(e, "mailto:"));
                emails.extend(email.filter(|e| !e.is_empty()).map(str::to_string));
            }
            _ => {}
        }
    }

    let mut author = Author::new(format!("{} {}", given, surname).trim());
    author.emails.extend(emails);
    AuthorNode { author, ref_ids }
}

fn institution(node: &Value) -> Option<Institution> {
    let ref_id = attr(node, "id")?.to_string();
    let name = children(node)
        .iter()
        .filter(|prop| node_name(prop) == "textfn")
        .find_map(|prop| {
            node_text(prop).or_else(|| prop.get("__text__").and_then(Value::as_str))
        })?;
    Some(Institution {
        ref_id,
        name: name.trim().to_string(),
    })
}

/// Abstract of the article, empty when the layout is not recognised
fn abstract_text(data: &Value) -> String {
    let containers = data
        .pointer("/abstracts/content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    ABSTRACT_MATCHERS
        .iter()
        .find_map(|matcher| matcher(containers))
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// A highlights box followed by the abstract proper
fn highlights_layout(containers: &[Value]) -> Option<String> {
    let [highlights, abstract_box] = containers else {
        return None;
    };
    let heading = children(highlights).first()?;
    let title = node_text(heading).or_else(|| children(heading).first().and_then(node_text))?;
    if !HIGHLIGHT_TITLES.contains(&title.trim()) {
        return None;
    }
    paragraph(abstract_box)
}

/// The abstract as the first container
fn plain_layout(containers: &[Value]) -> Option<String> {
    paragraph(containers.first()?)
}

/// First paragraph of an abstract container; the heading comes first.
///
/// A paragraph interrupted by inline markup is split into several nodes, in
/// which case the first and third pieces hold the text.
fn paragraph(container: &Value) -> Option<String> {
    let section = children(container).get(1)?;
    let para = children(section).first()?;
    if let Some(text) = node_text(para) {
        return Some(text.to_string());
    }

    let pieces = children(para);
    let first = pieces.first().and_then(node_text)?;
    match pieces.get(2).and_then(node_text) {
        Some(third) if pieces.len() > 2 => Some(format!("{}{}", first, third)),
        _ => Some(first.to_string()),
    }
}
