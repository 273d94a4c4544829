//! Mapping from publisher keys to search providers.

use super::{
    CambridgeSearch, ElsevierSearch, NatureSearch, OxfordSearch, SearchProvider, SourceError,
    SpringerSearch, TandFSearch, WileySearch,
};
use crate::models::{Publisher, SearchSettings};

/// Create the search provider for a publisher
pub fn search_provider(
    publisher: Publisher,
    settings: SearchSettings,
) -> Result<Box<dyn SearchProvider>, SourceError> {
    if settings.identifiers.is_empty() {
        return Err(SourceError::InvalidRequest(format!(
            "no journal identifiers given for '{}'",
            settings.journal_shortname
        )));
    }
    if settings.start_year > settings.end_year {
        return Err(SourceError::InvalidRequest(format!(
            "start year {} is after end year {}",
            settings.start_year, settings.end_year
        )));
    }

    let provider: Box<dyn SearchProvider> = match publisher {
        Publisher::Elsevier => Box::new(ElsevierSearch::new(settings)),
        Publisher::Springer => Box::new(SpringerSearch::new(settings)),
        Publisher::Wiley => Box::new(WileySearch::new(settings)),
        Publisher::TandF => Box::new(TandFSearch::new(settings)),
        Publisher::Nature => Box::new(NatureSearch::new(settings)),
        Publisher::Oxford => Box::new(OxfordSearch::new(settings)),
        Publisher::Cambridge => Box::new(CambridgeSearch::new(settings)),
    };
    Ok(provider)
}

/// Create the search provider for a publisher key such as `"wiley"`
pub fn search_provider_for(
    key: &str,
    settings: SearchSettings,
) -> Result<Box<dyn SearchProvider>, SourceError> {
    let publisher = key
        .parse::<Publisher>()
        .map_err(|_| SourceError::UnknownPublisher(key.to_string()))?;
    search_provider(publisher, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SearchSettings {
        SearchSettings::new("jf", vec!["1540-6261".into()], 2018, 2021)
    }

    #[test]
    fn test_every_publisher_has_a_provider() {
        for publisher in Publisher::ALL {
            let provider = search_provider(publisher, settings()).unwrap();
            assert_eq!(provider.publisher(), publisher);
            assert_eq!(provider.generate_queries().len(), 4);
            assert_eq!(provider.generate_queries()[0].year, 2021);
        }
    }

    #[test]
    fn test_unknown_key() {
        let result = search_provider_for("jstor", settings());
        assert!(matches!(result, Err(SourceError::UnknownPublisher(key)) if key == "jstor"));
    }

    #[test]
    fn test_invalid_settings() {
        let no_ids = SearchSettings::new("jf", Vec::new(), 2018, 2021);
        assert!(matches!(
            search_provider(Publisher::Wiley, no_ids),
            Err(SourceError::InvalidRequest(_))
        ));

        let reversed = SearchSettings::new("jf", vec!["x".into()], 2021, 2018);
        assert!(search_provider_for("wiley", reversed).is_err());
    }
}
