//! Session types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cookie name to value mapping.
///
/// Holds at most one value per name; later writes replace earlier ones.
/// Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar(BTreeMap<String, String>);

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cookie, returning `true` if the stored value changed
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.0.insert(name.into(), value.clone()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    /// Merge cookies into the jar, returning `true` if any value changed
    pub fn merge<I, K, V>(&mut self, cookies: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        cookies
            .into_iter()
            .fold(false, |changed, (name, value)| self.insert(name, value) || changed)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the jar as a `Cookie` request header value
    pub fn header_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        Some(
            self.iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut jar = Self::new();
        jar.merge(iter);
        jar
    }
}
