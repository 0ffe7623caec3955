use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_datadir")]
    pub datadir: String,
    #[serde(default = "default_categories_file")]
    pub categories: String,
    #[serde(default = "default_titles_file")]
    pub titles: String,
    /// Treat a dataset document that lacks its top-level list as empty
    /// instead of refusing to start.
    #[serde(default)]
    pub lenient: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            datadir: default_datadir(),
            categories: default_categories_file(),
            titles: default_titles_file(),
            lenient: false,
        }
    }
}

fn default_port() -> String {
    "4000".to_string()
}

fn default_datadir() -> String {
    "data".to_string()
}

fn default_categories_file() -> String {
    "categories.json".to_string()
}

fn default_titles_file() -> String {
    "titles.json".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        Self::from_yaml(&content).map_err(|e| ConfigError::ParseError(path.to_string(), e))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a map.
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content)
    }

    /// Relative file names are resolved against `catalog.datadir`.
    pub fn get_categories_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.datadir).join(&self.catalog.categories)
    }

    pub fn get_titles_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.datadir).join(&self.catalog.titles)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
}
