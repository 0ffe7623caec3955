use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::title::Title;

/// The full dataset, loaded once and never mutated afterwards.
#[derive(Debug)]
pub struct Catalog {
    categories: Vec<String>,
    titles: Vec<Title>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already parsed records. Fails on a repeated id.
    pub fn new(categories: Vec<String>, mut titles: Vec<Title>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(titles.len());

        for (pos, title) in titles.iter_mut().enumerate() {
            if index.insert(title.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(title.id.clone()));
            }
            if title.dedup_categories() {
                debug!("Dropped repeated categories on {}", title.id);
            }
            if title.date.is_some() && title.release_date().is_none() {
                warn!("Title {} has an unparsable date {:?}", title.id, title.date);
            }
        }

        Ok(Self {
            categories,
            titles,
            index,
        })
    }

    pub fn load(
        categories_path: &Path,
        titles_path: &Path,
        lenient: bool,
    ) -> Result<Self, CatalogError> {
        info!("Loading categories from {}", categories_path.display());
        let categories_json = read_document(categories_path)?;
        info!("Loading titles from {}", titles_path.display());
        let titles_json = read_document(titles_path)?;

        let categories = parse_document(
            &categories_json,
            "categories",
            &categories_path.display().to_string(),
            lenient,
        )?;
        let titles = parse_document(
            &titles_json,
            "titles",
            &titles_path.display().to_string(),
            lenient,
        )?;

        let catalog = Self::new(categories, titles)?;
        info!(
            "Catalog loaded: {} categories, {} titles",
            catalog.categories.len(),
            catalog.titles.len()
        );
        Ok(catalog)
    }

    /// Same as [`Catalog::load`], from in-memory documents.
    pub fn from_json(
        categories_json: &str,
        titles_json: &str,
        lenient: bool,
    ) -> Result<Self, CatalogError> {
        let categories = parse_document(categories_json, "categories", "<categories>", lenient)?;
        let titles = parse_document(titles_json, "titles", "<titles>", lenient)?;
        Self::new(categories, titles)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Title> {
        self.index.get(id).map(|&pos| &self.titles[pos])
    }

    pub fn list_categories(&self) -> &[String] {
        &self.categories
    }

    pub fn titles(&self) -> &[Title] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

fn read_document(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path)
        .map_err(|e| CatalogError::ReadError(path.display().to_string(), e))
}

/// A dataset document is either a bare array or an object holding the
/// array under `key`.
fn parse_document<T: DeserializeOwned>(
    content: &str,
    key: &str,
    source: &str,
    lenient: bool,
) -> Result<Vec<T>, CatalogError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| CatalogError::ParseError(source.to_string(), e))?;

    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove(key) {
            Some(list) => list,
            None if lenient => {
                warn!("{} has no \"{}\" list, using an empty one", source, key);
                return Ok(Vec::new());
            }
            None => return Err(CatalogError::MissingKey(source.to_string(), key.to_string())),
        },
        _ => return Err(CatalogError::ShapeError(source.to_string())),
    };

    serde_json::from_value(list).map_err(|e| CatalogError::ParseError(source.to_string(), e))
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read dataset file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse dataset {0}: {1}")]
    ParseError(String, serde_json::Error),
    #[error("Dataset {0} is neither an array nor an object")]
    ShapeError(String),
    #[error("Dataset {0} has no \"{1}\" list")]
    MissingKey(String, String),
    #[error("Duplicate title id: {0}")]
    DuplicateId(String),
}
