//! Portal login via a real browser window

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tact_core::{CookieJar, CredentialAcquirer};
use tracing::{info, warn};

use crate::error::{BrowserError, Result};
use crate::session::{BrowserConfig, BrowserSession};

/// Login pages that live under `/portal` but are not a signed-in view
const LOGIN_PATHS: &[&str] = &["/portal/login", "/portal/xlogin", "/portal/relogin"];

/// Credential acquirer that waits for the user to sign in through Chrome
#[derive(Debug, Clone)]
pub struct BrowserLogin {
    base_url: String,
    config: BrowserConfig,
}

impl BrowserLogin {
    pub fn new(base_url: impl Into<String>, config: BrowserConfig) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    /// Build from the gateway configuration
    pub fn from_config(config: &tact_core::Config) -> Self {
        let browser = BrowserConfig::builder()
            .headless(config.login.headless)
            .login_timeout(config.login.timeout())
            .window_size(config.login.window_width, config.login.window_height)
            .enable_gpu(config.login.enable_gpu)
            .user_agent(config.portal.user_agent.clone())
            .build();

        Self::new(config.portal.base_url.clone(), browser)
    }

    pub fn login_url(&self) -> String {
        format!("{}/portal/login", self.base_url)
    }

    /// Blocking login flow. The browser lives only inside this call.
    fn run(&self, headless: bool) -> Result<CookieJar> {
        let mut config = self.config.clone();
        config.headless = headless;

        let session = BrowserSession::launch(&config)?;
        session.navigate(&self.login_url())?;

        info!("Waiting for login... do not close the browser window");
        wait_for_portal(
            || session.current_url(),
            &self.base_url,
            config.login_timeout,
            config.poll_interval,
        )?;
        info!("Login detected, collecting cookies");

        let jar: CookieJar = session.cookies()?.into_iter().collect();
        info!("Collected {} cookies", jar.len());

        Ok(jar)
    }
}

#[async_trait]
impl CredentialAcquirer for BrowserLogin {
    async fn acquire(&self, headless: bool) -> tact_core::Result<CookieJar> {
        let login = self.clone();

        let jar = tokio::task::spawn_blocking(move || login.run(headless))
            .await
            .map_err(|e| tact_core::Error::Auth(format!("Login task failed: {}", e)))??;

        Ok(jar)
    }
}

/// Poll `current_url` until it shows a signed-in portal page.
///
/// The URL is always checked at least once, even with a zero timeout.
fn wait_for_portal<F>(
    current_url: F,
    base_url: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()>
where
    F: Fn() -> String,
{
    let deadline = Instant::now() + timeout;

    loop {
        let url = current_url();
        if is_login_complete(&url, base_url) {
            return Ok(());
        }

        if Instant::now() >= deadline {
            warn!("Login timed out, browser was at: {}", url);
            return Err(BrowserError::Timeout(timeout));
        }

        std::thread::sleep(poll_interval);
    }
}

/// Whether `url` is a signed-in portal page on `base_url`
pub fn is_login_complete(url: &str, base_url: &str) -> bool {
    let base_url = base_url.trim_end_matches('/');
    let Some(path) = url.strip_prefix(base_url) else {
        return false;
    };

    let is_portal = path == "/portal" || path.starts_with("/portal/") || path.starts_with("/portal?");
    is_portal && !LOGIN_PATHS.iter().any(|login| path.starts_with(login))
}
