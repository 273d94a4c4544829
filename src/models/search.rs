//! Search settings and listing-page queries.

use serde::{Deserialize, Serialize};

/// What to search for: one journal over a range of years
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Short name of the journal, used as the storage directory
    pub journal_shortname: String,

    /// Publisher-specific journal identifiers (ISSN, series key, display name, ...)
    pub identifiers: Vec<String>,

    /// First year of the range (inclusive)
    pub start_year: i32,

    /// Last year of the range (inclusive)
    pub end_year: i32,

    /// Article-type filter, `None` to use the publisher default
    #[serde(default)]
    pub article_types: Option<Vec<String>>,

    /// Title/type exclusions, `None` to use the publisher default
    #[serde(default)]
    pub exclusions: Option<Vec<String>>,
}

impl SearchSettings {
    /// Create settings for a journal and year range
    pub fn new(
        journal_shortname: impl Into<String>,
        identifiers: Vec<String>,
        start_year: i32,
        end_year: i32,
    ) -> Self {
        Self {
            journal_shortname: journal_shortname.into(),
            identifiers,
            start_year,
            end_year,
            article_types: None,
            exclusions: None,
        }
    }

    /// Override the article-type filter
    pub fn article_types(mut self, types: Vec<String>) -> Self {
        self.article_types = Some(types);
        self
    }

    /// Override the exclusions
    pub fn exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = Some(exclusions);
        self
    }

    /// Years of the range, newest first
    pub fn years_newest_first(&self) -> impl Iterator<Item = i32> {
        (self.start_year..=self.end_year).rev()
    }

    /// First journal identifier, or an empty string
    pub fn primary_identifier(&self) -> &str {
        self.identifiers.first().map(String::as_str).unwrap_or_default()
    }
}

/// One listing-page query: a year plus the publisher's query parameters
///
/// Pagination state (page number or offset) lives in the parameters and is
/// advanced by the search loop on a private copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    pub year: i32,
    pub params: Vec<(String, String)>,

    /// Results per page (or per offset step), fixed per publisher
    pub page_size: usize,
}

impl ListingQuery {
    /// Create an empty query for a year
    pub fn new(year: i32, page_size: usize) -> Self {
        Self {
            year,
            params: Vec::new(),
            page_size,
        }
    }

    /// Add or replace a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Add or replace a parameter in place
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Form-encoded query string (spaces as `+`)
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// Full URL for a base ending in `?`
    pub fn url(&self, base: &str) -> String {
        format!("{}{}", base, self.query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_years_newest_first() {
        let settings = SearchSettings::new("jfe", vec!["0304-405X".into()], 2018, 2021);
        assert_eq!(
            settings.years_newest_first().collect::<Vec<_>>(),
            vec![2021, 2020, 2019, 2018]
        );
        assert_eq!(settings.primary_identifier(), "0304-405X");
    }

    #[test]
    fn test_query_set_replaces_in_place() {
        let mut query = ListingQuery::new(2020, 100)
            .param("show", 100)
            .param("offset", 0);
        query.set("offset", 200);

        assert_eq!(query.get("offset"), Some("200"));
        assert_eq!(query.params.len(), 2);
        assert_eq!(query.params[1].0, "offset");
    }

    #[test]
    fn test_query_string_uses_plus_for_spaces() {
        let query = ListingQuery::new(2020, 20)
            .param("sort", "Date - Newest First")
            .param("rg_ArticleDate", "01/01/2020 TO 12/31/2020");

        assert_eq!(
            query.url("https://academic.oup.com/journals/search-results?"),
            "https://academic.oup.com/journals/search-results?sort=Date+-+Newest+First&rg_ArticleDate=01%2F01%2F2020+TO+12%2F31%2F2020"
        );
    }
}
