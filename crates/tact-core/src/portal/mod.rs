//! Portal operations
//!
//! Typed reads over the Sakai entity endpoints plus the favorites
//! read-modify-write protocol. Primary data (sites, assignments, resources,
//! announcements) propagates failures; favorites are advisory and degrade
//! to "no favorites" or a `false` result instead.

mod favorites;
mod types;

pub use types::{FavoriteSites, Record, Site};

use tracing::{debug, warn};

use crate::client::PortalClient;
use crate::Result;
use types::{RawSite, unwrap_collection};

/// Upper bound the portal applies to one page of sites
const SITE_LIMIT: usize = 200;

/// High-level access to the portal for the signed-in user
#[derive(Clone)]
pub struct TactPortal {
    client: PortalClient,
}

impl TactPortal {
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    /// All sites of the user, in upstream order, tagged with favorite state
    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        let data = self
            .client
            .get(&format!("/direct/site.json?_limit={}", SITE_LIMIT))
            .await?;
        let records = unwrap_collection(data, "site_collection");

        let favorites = self.list_favorite_site_ids().await;
        let base_url = self.client.base_url();

        let mut sites = Vec::with_capacity(records.len());
        for record in records {
            let raw: RawSite = match serde_json::from_value(record) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping malformed site record: {}", e);
                    continue;
                }
            };

            match Site::from_raw(raw, base_url, &favorites) {
                Some(site) => sites.push(site),
                None => warn!("Skipping site record without an id"),
            }
        }

        debug!("Listed {} sites ({} favorites)", sites.len(), favorites.len());
        Ok(sites)
    }

    /// Assignments of the current user
    pub async fn list_assignments(&self) -> Result<Vec<Record>> {
        self.collection("/direct/assignment/my.json", "assignment_collection")
            .await
    }

    /// Resources (content) of one site
    pub async fn list_resources(&self, site_id: &str) -> Result<Vec<Record>> {
        self.collection(
            &format!("/direct/content/site/{}.json", path_segment(site_id)),
            "content_collection",
        )
        .await
    }

    /// Announcements visible to the current user
    pub async fn list_announcements(&self) -> Result<Vec<Record>> {
        self.collection("/direct/announcement/user.json", "announcement_collection")
            .await
    }

    async fn collection(&self, path: &str, key: &str) -> Result<Vec<Record>> {
        let data = self.client.get(path).await?;
        let records = unwrap_collection(data, key);
        debug!("Fetched {} records from {}", records.len(), path);
        Ok(records)
    }
}

/// Percent-encode one path segment so ids cannot reach other portal paths
fn path_segment(segment: &str) -> String {
    // byte_serialize writes spaces as `+` and escapes a literal `+` as `%2B`
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortalConfig;
    use crate::session::SessionStore;
    use crate::Error;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(super) fn portal_for(server: &MockServer, dir: &TempDir) -> TactPortal {
        let config = PortalConfig {
            base_url: server.uri(),
            user_agent: "tact-test-agent/1.0".to_string(),
            request_timeout_secs: 5,
        };
        let session = Arc::new(SessionStore::open(dir.path().join("cookies.json")));
        TactPortal::new(PortalClient::new(&config, session).unwrap())
    }

    async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_list_sites_merges_favorites() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/direct/site.json"))
            .and(query_param("_limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "site_collection": [{"id": "A"}, {"id": "B", "url": "http://x"}]
            })))
            .mount(&server)
            .await;
        mount_json(
            &server,
            "/portal/favorites/list",
            json!({"favoriteSiteIds": ["A"], "autoFavoritesEnabled": true}),
        )
        .await;

        let sites = portal.list_sites().await.unwrap();
        assert_eq!(
            sites,
            vec![
                Site {
                    id: "A".to_string(),
                    title: None,
                    url: format!("{}/portal/site/A", server.uri()),
                    is_favorite: true,
                },
                Site {
                    id: "B".to_string(),
                    title: None,
                    url: "http://x".to_string(),
                    is_favorite: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_sites_survives_favorites_failure() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        mount_json(
            &server,
            "/direct/site.json",
            json!({"site_collection": [
                {"id": "A", "title": "Physics"},
                {"id": "B"},
                {"id": "C"}
            ]}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/portal/favorites/list"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sites = portal.list_sites().await.unwrap();
        assert_eq!(sites.len(), 3);
        assert!(sites.iter().all(|s| !s.is_favorite));
        assert_eq!(sites[0].title.as_deref(), Some("Physics"));
    }

    #[tokio::test]
    async fn test_list_sites_skips_records_without_id() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        mount_json(
            &server,
            "/direct/site.json",
            json!({"site_collection": [{"title": "no id"}, {"id": "B"}, 42]}),
        )
        .await;
        mount_json(&server, "/portal/favorites/list", json!({"favoriteSiteIds": []})).await;

        let sites = portal.list_sites().await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, "B");
    }

    #[tokio::test]
    async fn test_list_sites_propagates_site_failure() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/direct/site.json"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = portal.list_sites().await.unwrap_err();
        assert!(matches!(err, Error::Status { .. }));
    }

    #[tokio::test]
    async fn test_list_sites_missing_collection_is_empty() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        mount_json(&server, "/direct/site.json", json!({})).await;

        assert!(portal.list_sites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_assignments() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        mount_json(
            &server,
            "/direct/assignment/my.json",
            json!({"assignment_collection": [{"id": "a1", "title": "Report"}], "entityPrefix": "assignment"}),
        )
        .await;

        let assignments = portal.list_assignments().await.unwrap();
        assert_eq!(assignments, vec![json!({"id": "a1", "title": "Report"})]);
    }

    #[tokio::test]
    async fn test_list_resources_uses_site_path() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        mount_json(
            &server,
            "/direct/content/site/site-123.json",
            json!({"content_collection": [{"title": "syllabus.pdf"}, {"title": "slides.pdf"}]}),
        )
        .await;

        let resources = portal.list_resources("site-123").await.unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1]["title"], "slides.pdf");
    }

    #[tokio::test]
    async fn test_list_resources_encodes_site_id() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/direct/content/site/x%2F..%2F..%2Fportal%3Fa%3D1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content_collection": []})))
            .expect(1)
            .mount(&server)
            .await;

        let resources = portal.list_resources("x/../../portal?a=1").await.unwrap();
        assert!(resources.is_empty());
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("site-123"), "site-123");
        assert_eq!(path_segment("a/b"), "a%2Fb");
        assert_eq!(path_segment("a b+c"), "a%20b%2Bc");
        assert_eq!(path_segment("q?x#y"), "q%3Fx%23y");
    }

    #[tokio::test]
    async fn test_list_announcements_missing_key() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        mount_json(&server, "/direct/announcement/user.json", json!({"other": []})).await;

        assert!(portal.list_announcements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_announcements_propagates_failure() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let portal = portal_for(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/direct/announcement/user.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(portal.list_announcements().await.is_err());
    }
}
