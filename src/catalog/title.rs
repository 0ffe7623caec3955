use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One catalog entry, as stored in the titles document and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub id: String,
    #[serde(rename = "type")]
    pub title_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub runtime: Option<u32>,
}

impl Title {
    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// `needle` must already be lower-cased.
    pub fn title_contains(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        let date = self.date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }

    /// Drop repeated category names, keeping the first occurrence.
    pub(crate) fn dedup_categories(&mut self) -> bool {
        let before = self.categories.len();
        let mut seen = Vec::with_capacity(before);
        self.categories.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(c.clone());
                true
            }
        });
        self.categories.len() != before
    }
}
