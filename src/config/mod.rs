//! Configuration management.
//!
//! Settings come from a TOML file, overridden by `JOURNAL_HARVESTER__*`
//! environment variables (`__` separates nested keys, for example
//! `JOURNAL_HARVESTER__DOWNLOADS__CONCURRENCY=4`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! elsevier = "your-api-key"
//!
//! [storage]
//! base_dir = "./data"
//!
//! [downloads]
//! concurrency = 2
//! max_retries = 2
//! delay = 1.0
//! min_markup_bytes = 102400
//! limit = 1400
//!
//! [scopus]
//! page_size = 25
//! max_results = 1000
//! delay = 3.0
//!
//! [[journals]]
//! publisher = "springer"
//! journal_shortname = "exex"
//! identifiers = ["10683"]
//! start_year = 2015
//! end_year = 2020
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::download::DownloadSettings;
use crate::models::{Publisher, SearchSettings};
use crate::sources::scopus::ScopusSettings;

const ENV_PREFIX: &str = "JOURNAL_HARVESTER";
const CONFIG_FILE_NAME: &str = "journal-harvester.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Where downloaded documents are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// Download scheduler settings
    #[serde(default)]
    pub downloads: DownloadSettings,

    /// Scopus API paging
    #[serde(default)]
    pub scopus: ScopusSettings,

    /// Journals to harvest
    #[serde(default)]
    pub journals: Vec<JournalConfig>,
}

impl Config {
    /// Elsevier API key from the file, falling back to `ELSEVIER_API_KEY`
    pub fn elsevier_api_key(&self) -> Option<String> {
        self.api_keys
            .elsevier
            .clone()
            .or_else(|| std::env::var("ELSEVIER_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Configured journal by short name
    pub fn journal(&self, shortname: &str) -> Option<&JournalConfig> {
        self.journals
            .iter()
            .find(|j| j.journal_shortname.eq_ignore_ascii_case(shortname))
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Elsevier developer key, used for the Scopus search API
    #[serde(default)]
    pub elsevier: Option<String>,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the `publisher/journal/{previews,fulltexts}` tree
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// A journal to harvest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    pub publisher: Publisher,

    pub journal_shortname: String,

    /// Full journal title, needed for Scopus queries
    #[serde(default)]
    pub title: Option<String>,

    /// Publisher-specific identifiers (ISSN, series key, ...)
    pub identifiers: Vec<String>,

    pub start_year: i32,

    pub end_year: i32,

    #[serde(default)]
    pub article_types: Option<Vec<String>>,

    #[serde(default)]
    pub exclusions: Option<Vec<String>>,
}

impl JournalConfig {
    /// Search settings for this journal
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            journal_shortname: self.journal_shortname.clone(),
            identifiers: self.identifiers.clone(),
            start_year: self.start_year,
            end_year: self.end_year,
            article_types: self.article_types.clone(),
            exclusions: self.exclusions.clone(),
        }
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Save configuration as TOML
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigFileError> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Look for a configuration file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("journal-harvester").join("config.toml"));
    }
    candidates.into_iter().find(|path| path.is_file())
}

/// Configuration from the first file found, or defaults
pub fn get_config() -> Result<Config, config::ConfigError> {
    match find_config_file() {
        Some(path) => {
            tracing::info!("Using config file: {}", path.display());
            load_config(&path)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.base_dir, PathBuf::from("./data"));
        assert_eq!(config.downloads.concurrency, 2);
        assert_eq!(config.downloads.max_retries, 2);
        assert_eq!(config.scopus.page_size, 25);
        assert!(config.journals.is_empty());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api_keys]
elsevier = "file-key"

[storage]
base_dir = "/tmp/harvest"

[downloads]
concurrency = 4
delay = 0.5

[[journals]]
publisher = "wiley"
journal_shortname = "jofi"
identifiers = ["1540-6261"]
start_year = 2018
end_year = 2020
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.elsevier_api_key().as_deref(), Some("file-key"));
        assert_eq!(config.storage.base_dir, PathBuf::from("/tmp/harvest"));
        assert_eq!(config.downloads.concurrency, 4);
        assert_eq!(config.downloads.delay, Duration::from_millis(500));
        assert_eq!(config.downloads.max_retries, 2);

        let journal = config.journal("JOFI").unwrap();
        assert_eq!(journal.publisher, Publisher::Wiley);
        let settings = journal.search_settings();
        assert_eq!(settings.identifiers, vec!["1540-6261"]);
        assert_eq!(settings.years_newest_first().collect::<Vec<_>>(), vec![2020, 2019, 2018]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.downloads.limit = 50;
        config.journals.push(JournalConfig {
            publisher: Publisher::Elsevier,
            journal_shortname: "jebo".to_string(),
            title: Some("Journal of Economic Behavior & Organization".to_string()),
            identifiers: vec!["271680".to_string()],
            start_year: 2019,
            end_year: 2020,
            article_types: None,
            exclusions: None,
        });
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.downloads.limit, 50);
        assert_eq!(loaded.journals, config.journals);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/config.toml")).is_err());
    }
}
