use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::manager::ManagerError;

/// Key/value tags of one managed object, kept sorted so state is stable.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct KeyValueTags(BTreeMap<String, String>);

impl KeyValueTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `tags` attribute of a configuration or state value.
    /// A missing or null attribute is an empty tag set.
    pub fn from_attribute(value: &Value) -> Result<Self, ManagerError> {
        match value.get("tags") {
            None | Some(Value::Null) => Ok(Self::new()),
            Some(tags) => serde_json::from_value(tags.clone())
                .map_err(|e| ManagerError::InvalidInput(format!("tags: {}", e))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Keys present here but missing from `new`.
    pub fn removed(&self, new: &KeyValueTags) -> Vec<String> {
        self.0
            .keys()
            .filter(|k| !new.0.contains_key(*k))
            .cloned()
            .collect()
    }

    /// Entries of `new` that are absent here or carry a different value.
    pub fn updated(&self, new: &KeyValueTags) -> KeyValueTags {
        new.0
            .iter()
            .filter(|(k, v)| self.0.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn into_hash_map(self) -> HashMap<String, String> {
        self.0.into_iter().collect()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, String)> for KeyValueTags {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for KeyValueTags {
    fn from(value: HashMap<String, String>) -> Self {
        value.into_iter().collect()
    }
}
