//! Authenticated portal HTTP client
//!
//! Every request carries the session cookies and the configured
//! User-Agent. Cookies set by the portal on successful responses (sticky
//! session routing in particular) are fed back into the session store.

use std::sync::Arc;

use reqwest::header::{COOKIE, HeaderMap};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::PortalConfig;
use crate::session::SessionStore;
use crate::{Error, Result};

/// Body of a form POST response.
///
/// Some portal write endpoints answer with an empty or HTML body on
/// success, so non-JSON bodies are returned as text instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum PostResponse {
    Json(Value),
    Text(String),
}

/// HTTP client bound to the portal origin and the process session
#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl PortalClient {
    /// Create a new portal client
    pub fn new(config: &PortalConfig, session: Arc<SessionStore>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Absolute URL for a portal-relative path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.get_json(path).await
    }

    /// GET a JSON document and decode it into `T`
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.get_text(path).await?;

        serde_json::from_str(&text).map_err(|e| {
            error!(path = %path, error = %e, "Portal returned an undecodable JSON body");
            Error::Json(e)
        })
    }

    /// GET a page as raw text
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let response = self.send(self.http.get(self.url(path)), path).await?;
        Self::read_text(response, path).await
    }

    /// POST a form-encoded body
    ///
    /// # Arguments
    /// * `path` - portal-relative path
    /// * `form` - form fields
    /// * `headers` - extra request headers
    pub async fn post(
        &self,
        path: &str,
        form: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<PostResponse> {
        let request = self.http.post(self.url(path)).headers(headers).form(form);
        let response = self.send(request, path).await?;
        let text = Self::read_text(response, path).await?;

        Ok(match serde_json::from_str(&text) {
            Ok(value) => PostResponse::Json(value),
            Err(_) => PostResponse::Text(text),
        })
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response> {
        let request = match self.session.cookie_header() {
            Some(cookies) => request.header(COOKIE, cookies),
            None => request,
        };

        debug!("Portal request: {}", path);

        let response = request.send().await.map_err(|e| {
            error!(path = %path, error = %e, "Portal request failed");
            Error::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(path = %path, status = %status, "Portal returned an error status");
            return Err(Error::Status {
                path: path.to_string(),
                status,
            });
        }

        let cookies: Vec<(String, String)> = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        if !cookies.is_empty() {
            self.session.update(cookies)?;
        }

        Ok(response)
    }

    async fn read_text(response: Response, path: &str) -> Result<String> {
        response.text().await.map_err(|e| {
            error!(path = %path, error = %e, "Failed to read portal response body");
            Error::Http(e)
        })
    }
}
