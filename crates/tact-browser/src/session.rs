//! Browser session management
//!
//! Owns one Chrome process for the duration of a login. Dropping the
//! session closes the browser.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use tracing::{debug, info};

use crate::error::{BrowserError, Result};

/// Browser session configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Whether to run in headless mode
    pub headless: bool,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// How long the user has to complete the login
    pub login_timeout: Duration,
    /// How often the current URL is checked while waiting
    pub poll_interval: Duration,
    /// Enable GPU acceleration
    pub enable_gpu: bool,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            width: 1280,
            height: 900,
            login_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_millis(500),
            enable_gpu: false,
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    /// Create a new configuration builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.config.login_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn enable_gpu(mut self, enable: bool) -> Self {
        self.config.enable_gpu = enable;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Managed browser session
pub struct BrowserSession {
    tab: Arc<Tab>,
    // Kept alive for the tab; killed on drop
    _browser: Browser,
}

impl BrowserSession {
    /// Launch a browser with the given configuration
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        info!("Launching login browser (headless: {})", config.headless);

        let args = launch_args(config);
        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        // The CDP connection is dropped after this much inactivity, which
        // must outlast a human typing a password and confirming MFA.
        let idle_timeout = config.login_timeout + Duration::from_secs(30);

        let launch_options = LaunchOptionsBuilder::default()
            .headless(config.headless)
            .args(os_args)
            .idle_browser_timeout(idle_timeout)
            .build()
            .map_err(|e| {
                BrowserError::Initialization(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options).map_err(|e| {
            BrowserError::Initialization(format!("Failed to launch browser: {}", e))
        })?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::TabError(format!("Failed to open tab: {}", e)))?;

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    /// Navigate to a URL and wait for the first page load
    pub fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);

        self.tab.navigate_to(url).map_err(|e| {
            BrowserError::Navigation(format!("Failed to navigate to {}: {}", url, e))
        })?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// URL currently shown in the tab
    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// All cookies visible to the current page as name/value pairs
    pub fn cookies(&self) -> Result<Vec<(String, String)>> {
        let cookies = self
            .tab
            .get_cookies()
            .map_err(|e| BrowserError::Cookie(format!("Failed to read cookies: {}", e)))?;

        debug!("Read {} cookies from browser", cookies.len());

        Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        info!("Closing login browser");
    }
}

fn launch_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        format!("--window-size={},{}", config.width, config.height),
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
    ];

    if !config.enable_gpu {
        args.push("--disable-gpu".to_string());
        args.push("--disable-software-rasterizer".to_string());
    }

    if let Some(ref ua) = config.user_agent {
        args.push(format!("--user-agent={}", ua));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_default() {
        let config = BrowserConfig::default();
        assert!(!config.headless);
        assert_eq!(config.login_timeout, Duration::from_secs(300));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_browser_config_builder() {
        let config = BrowserConfig::builder()
            .headless(true)
            .window_size(1920, 1080)
            .login_timeout(Duration::from_secs(60))
            .poll_interval(Duration::from_millis(100))
            .user_agent("Custom Agent")
            .build();

        assert!(config.headless);
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert_eq!(config.login_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.user_agent, Some("Custom Agent".to_string()));
    }

    #[test]
    fn test_launch_args() {
        let config = BrowserConfig::builder()
            .window_size(800, 600)
            .user_agent("UA/1.0")
            .build();
        let args = launch_args(&config);

        assert!(args.contains(&"--window-size=800,600".to_string()));
        assert!(args.contains(&"--user-agent=UA/1.0".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));

        let gpu = launch_args(&BrowserConfig::builder().enable_gpu(true).build());
        assert!(!gpu.contains(&"--disable-gpu".to_string()));
    }
}
