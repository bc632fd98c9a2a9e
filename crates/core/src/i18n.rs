use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Translation strings for one language, keyed by dotted path
/// (`{"blog": {"title": "Blog"}}` becomes `blog.title`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationTable {
    entries: BTreeMap<String, String>,
}

impl TranslationTable {
    pub fn from_value(value: &Value) -> Self {
        let mut entries = BTreeMap::new();
        flatten_into(value, "", &mut entries);
        Self { entries }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Translated string, or the key itself when missing
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Only string leaves are kept; arrays, numbers and nulls are not translatable.
fn flatten_into(value: &Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, out);
            }
        }
        Value::String(s) if !prefix.is_empty() => {
            out.insert(prefix.to_string(), s.clone());
        }
        _ => {
            log::debug!("[i18n] skipping non-string entry '{}'", prefix);
        }
    }
}
