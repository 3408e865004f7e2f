//! Portal data types

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque upstream record (assignment, resource, announcement)
pub type Record = Value;

/// A course or project site visible to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub title: Option<String>,
    pub url: String,
    pub is_favorite: bool,
}

impl Site {
    /// Build a site from an upstream record.
    ///
    /// Records without an id are rejected. A missing or empty `url` is
    /// derived as `{base_url}/portal/site/{id}`.
    pub(crate) fn from_raw(
        raw: RawSite,
        base_url: &str,
        favorites: &HashSet<String>,
    ) -> Option<Self> {
        let id = raw.id.filter(|id| !id.is_empty())?;

        let url = match raw.url {
            Some(url) if !url.is_empty() => url,
            _ => format!("{}/portal/site/{}", base_url, id),
        };

        Some(Self {
            is_favorite: favorites.contains(&id),
            id,
            title: raw.title,
            url,
        })
    }
}

/// Site entry as returned by `/direct/site.json`
#[derive(Debug, Deserialize)]
pub(crate) struct RawSite {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// The user's favorite sites as stored by the portal.
///
/// Writes replace the whole set, so the flag must be carried through
/// unchanged from the read that preceded them. A read that did not report
/// the flag leaves it `None`, and such a value must not be written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSites {
    #[serde(default)]
    pub favorite_site_ids: Vec<String>,
    #[serde(default)]
    pub auto_favorites_enabled: Option<bool>,
}

impl FavoriteSites {
    pub fn contains(&self, site_id: &str) -> bool {
        self.favorite_site_ids.iter().any(|id| id == site_id)
    }

    pub fn ids(&self) -> HashSet<String> {
        self.favorite_site_ids.iter().cloned().collect()
    }

    /// Desired favorites after marking `site_id` as (not) favorite.
    ///
    /// Returns `None` when the site is already in the requested state.
    pub fn with_site(&self, site_id: &str, favorite: bool) -> Option<Self> {
        if self.contains(site_id) == favorite {
            return None;
        }

        let mut updated = self.clone();
        if favorite {
            updated.favorite_site_ids.push(site_id.to_string());
        } else {
            updated.favorite_site_ids.retain(|id| id != site_id);
        }
        Some(updated)
    }
}

/// Pull the array stored under `key` out of a collection wrapper
pub(crate) fn unwrap_collection(mut value: Value, key: &str) -> Vec<Record> {
    match value.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}
