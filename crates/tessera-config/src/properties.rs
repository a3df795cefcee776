//! Flat string-keyed property maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tessera_core::{TesseraError, TesseraResult};

/// An ordered, flat `key -> value` configuration map.
///
/// Lookups fall back to ASCII case-insensitive matching because layered
/// sources may normalize key case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    /// Creates an empty property map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property, returning the map for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a property, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        self.0.insert(key.into(), value.to_string())
    }

    /// Removes a property.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Returns the trimmed value for `key`, treating blank values as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns the value for `key` or `default`.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parses a boolean property (`true`/`false`, any case).
    pub fn get_bool(&self, key: &str) -> TesseraResult<Option<bool>> {
        self.get(key)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(invalid_value(key, raw, "a boolean")),
            })
            .transpose()
    }

    /// Parses an unsigned integer property.
    pub fn get_u64(&self, key: &str) -> TesseraResult<Option<u64>> {
        self.get_parsed(key, "an unsigned integer")
    }

    /// Parses a property with [`FromStr`].
    pub fn get_parsed<T: FromStr>(&self, key: &str, expected: &str) -> TesseraResult<Option<T>> {
        self.get(key)
            .map(|raw| raw.parse::<T>().map_err(|_| invalid_value(key, raw, expected)))
            .transpose()
    }

    /// Returns true if the map holds a non-blank value for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn invalid_value(key: &str, raw: &str, expected: &str) -> TesseraError {
    TesseraError::Configuration(format!(
        "Property '{}' must be {}, got '{}'",
        key, expected, raw
    ))
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for Properties {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
