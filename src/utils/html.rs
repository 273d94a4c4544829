//! Small helpers over `scraper` shared by listing pages and article pages.

use scraper::{ElementRef, Html, Selector};

use super::collapse_whitespace;

/// First element under `scope` matching `css`
pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    let found = scope.select(&selector).next();
    found
}

/// All elements under `scope` matching `css`, in document order
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector '{}': {:?}", css, e);
            Vec::new()
        }
    }
}

/// Text content of an element with whitespace collapsed
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of the first match, if any
pub fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(scope, css).map(text_of)
}

/// Attribute value of the first match, if any
pub fn first_attr(scope: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    select_first(scope, css)
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string)
}

/// Content of the first `<meta name=...>` tag with a non-empty value
pub fn meta_content(document: &Html, name: &str) -> Option<String> {
    meta_contents(document, name).into_iter().next()
}

/// Contents of every `<meta name=...>` tag in document order
pub fn meta_contents(document: &Html, name: &str) -> Vec<String> {
    select_all(document.root_element(), &format!("meta[name=\"{}\"]", name))
        .into_iter()
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Content of the first `<meta property=...>` tag, as used by Open Graph
pub fn meta_property(document: &Html, property: &str) -> Option<String> {
    first_attr(
        document.root_element(),
        &format!("meta[property=\"{}\"]", property),
        "content",
    )
    .map(|c| c.trim().to_string())
    .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_lookup() {
        let html = Html::parse_document(
            r#"<html><head>
                <meta name="citation_author" content="Jane Smith">
                <meta name="citation_author" content=" ">
                <meta name="citation_author" content="Li Wei">
                <meta property="og:title" content=" Risk and Return ">
            </head><body></body></html>"#,
        );
        assert_eq!(meta_contents(&html, "citation_author"), vec!["Jane Smith", "Li Wei"]);
        assert_eq!(meta_content(&html, "citation_doi"), None);
        assert_eq!(meta_property(&html, "og:title").as_deref(), Some("Risk and Return"));
    }

    #[test]
    fn test_first_text_and_attr() {
        let html = Html::parse_fragment(
            r#"<div><h2><a href="/article/10.1/x">  A   title </a></h2></div>"#,
        );
        let root = html.root_element();
        assert_eq!(first_text(root, "h2 a").as_deref(), Some("A title"));
        assert_eq!(first_attr(root, "h2 a", "href").as_deref(), Some("/article/10.1/x"));
        assert!(select_first(root, "h3").is_none());
    }
}
