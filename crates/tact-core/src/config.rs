//! Configuration management
//!
//! Settings are resolved in the following order of priority:
//! 1. Environment variables
//! 2. `tact-gateway.toml` in the working directory
//! 3. Default values
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name
pub const CONFIG_FILE: &str = "tact-gateway.toml";

/// Desktop browser identity the portal expects to see
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration for tact-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream portal settings
    pub portal: PortalConfig,

    /// Cookie persistence settings
    pub session: SessionConfig,

    /// Interactive login settings
    pub login: LoginConfig,

    /// HTTP API configuration
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal origin, without trailing slash
    pub base_url: String,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl PortalConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the persisted cookie file
    pub cookie_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from("cookies.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Run the login browser without a window
    pub headless: bool,

    /// How long to wait for the user to finish signing in
    pub timeout_secs: u64,

    /// Login window size in pixels
    pub window_width: u32,
    pub window_height: u32,

    /// Let the login browser use GPU acceleration
    pub enable_gpu: bool,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            headless: false,
            timeout_secs: 300,
            window_width: 1280,
            window_height: 900,
            enable_gpu: false,
        }
    }
}

impl LoginConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port for HTTP API server
    pub port: u16,

    /// Allowed CORS origins (e.g., ["http://localhost:3000"])
    /// If unset, CORS is permissive
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origins: None,
        }
    }
}

fn default_base_url() -> String {
    "https://tact.ac.thers.ac.jp".to_string()
}

impl Config {
    /// Expand `${VAR_NAME}` references from the environment.
    ///
    /// Unknown variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.normalize();
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// Environment variables are expanded inside the file and then applied
    /// on top of it.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&Self::expand_env_vars(&content))?;
        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.normalize();
        config
    }

    /// Load `tact-gateway.toml` if present, otherwise the environment
    pub fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Override settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TACT_BASE_URL") {
            if !url.is_empty() {
                self.portal.base_url = url;
            }
        }
        if let Ok(ua) = std::env::var("TACT_USER_AGENT") {
            if !ua.is_empty() {
                self.portal.user_agent = ua;
            }
        }
        if let Some(secs) = env_parse("TACT_REQUEST_TIMEOUT") {
            self.portal.request_timeout_secs = secs;
        }

        if let Ok(path) = std::env::var("TACT_COOKIE_FILE") {
            if !path.is_empty() {
                self.session.cookie_file = PathBuf::from(path);
            }
        }

        if let Some(headless) = env_parse("TACT_LOGIN_HEADLESS") {
            self.login.headless = headless;
        }
        if let Some(secs) = env_parse("TACT_LOGIN_TIMEOUT") {
            self.login.timeout_secs = secs;
        }

        if let Some(port) = env_parse("API_PORT") {
            self.api.port = port;
        }
    }

    fn normalize(&mut self) {
        let trimmed = self.portal.base_url.trim_end_matches('/').len();
        self.portal.base_url.truncate(trimmed);
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
