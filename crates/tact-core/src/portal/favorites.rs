//! Favorite sites
//!
//! The portal stores favorites as one list that is replaced wholesale on
//! every write. Toggling a site therefore reads the current list, edits it
//! locally and writes the whole thing back. Two writers racing each other
//! can lose an update; the portal offers nothing to prevent that.

use std::collections::HashSet;

use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::{FavoriteSites, TactPortal};
use crate::client::PostResponse;
use crate::{Error, Result};

const FAVORITES_LIST: &str = "/portal/favorites/list";
const FAVORITES_UPDATE: &str = "/portal/favorites/update";

/// Favorite buttons in the portal's site navigation
const FAVORITE_BUTTON_SELECTOR: &str = ".Mrphs-sitesNav__favbtn";

impl TactPortal {
    /// Fresh read of the favorites list and its auto-favorites flag
    pub async fn favorites(&self) -> Result<FavoriteSites> {
        self.client().get_json(FAVORITES_LIST).await
    }

    /// Ids of the user's favorite sites.
    ///
    /// Falls back to scraping the portal navigation when the favorites
    /// endpoint fails, and to the empty set when that fails too.
    pub async fn list_favorite_site_ids(&self) -> HashSet<String> {
        match self.favorites().await {
            Ok(favorites) => return favorites.ids(),
            Err(e) => warn!("Favorites endpoint failed, trying portal page: {}", e),
        }

        match self.client().get_text("/portal").await {
            Ok(html) => scrape_favorite_ids(&html),
            Err(e) => {
                warn!("Could not determine favorite sites: {}", e);
                HashSet::new()
            }
        }
    }

    /// Mark a site as favorite. Returns whether the portal now agrees.
    pub async fn add_favorite(&self, site_id: &str) -> bool {
        self.set_favorite(site_id, true).await
    }

    /// Unmark a favorite site. Returns whether the portal now agrees.
    pub async fn remove_favorite(&self, site_id: &str) -> bool {
        self.set_favorite(site_id, false).await
    }

    async fn set_favorite(&self, site_id: &str, favorite: bool) -> bool {
        let current = match self.favorites().await {
            Ok(current) => current,
            Err(e) => {
                warn!(site_id = %site_id, error = %e, "Failed to read favorites before update");
                return false;
            }
        };

        let Some(updated) = current.with_site(site_id, favorite) else {
            debug!(site_id = %site_id, favorite, "Favorite already in requested state");
            return true;
        };

        if updated.auto_favorites_enabled.is_none() {
            warn!(
                site_id = %site_id,
                "Favorites response had no autoFavoritesEnabled flag, refusing to overwrite it"
            );
            return false;
        }

        match self.write_favorites(&updated).await {
            Ok(_) => {
                info!(site_id = %site_id, favorite, "Updated favorite sites");
                true
            }
            Err(e) => {
                warn!(site_id = %site_id, error = %e, "Failed to update favorites");
                false
            }
        }
    }

    /// Replace the portal's favorites list
    async fn write_favorites(&self, favorites: &FavoriteSites) -> Result<PostResponse> {
        let body = serde_json::to_string(favorites)?;

        let client = self.client();
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(ORIGIN, header_value(client.base_url())?);
        headers.insert(REFERER, header_value(&client.url("/portal"))?);

        client
            .post(FAVORITES_UPDATE, &[("userFavorites", body.as_str())], headers)
            .await
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Config(format!("Invalid header value {:?}: {}", value, e)))
}

/// Collect `data-site-id` of every favorite button on a portal page
fn scrape_favorite_ids(html: &str) -> HashSet<String> {
    let Ok(selector) = Selector::parse(FAVORITE_BUTTON_SELECTOR) else {
        return HashSet::new();
    };

    Html::parse_document(html)
        .select(&selector)
        .filter_map(|button| button.value().attr("data-site-id"))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
