use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Query string parameters as sent by the client.
///
/// A key that appears more than once has no single string value and reads
/// as absent.
#[derive(Debug)]
pub struct QueryParams {
    map: HashMap<String, Option<String>>,
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Keep every pair so repeated keys can be detected.
        let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
        Ok(QueryParams::from_pairs(pairs))
    }
}

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = HashMap::new();
        for (key, value) in pairs {
            map.entry(key.into())
                .and_modify(|v| *v = None)
                .or_insert_with(|| Some(value.into()));
        }
        QueryParams { map }
    }

    /// Keys match exactly; a repeated key yields `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(|v| v.as_deref())
    }

    /// Parse a numeric parameter. Returns `None` when the parameter is
    /// missing or is not a number; the result may still be non-finite.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.trim().parse::<f64>().ok()
    }
}
