//! Configuration management for Profile-Oxide

use crate::error::AuthError;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Scraper configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CDP endpoint of a running Chrome (e.g., "ws://localhost:9222")
    pub cdp_endpoint: String,

    /// Chrome executable to launch locally instead of attaching to `cdp_endpoint`
    pub chrome_path: Option<String>,

    /// Remote debugging port used when launching Chrome
    pub chrome_port: u16,

    /// Launch Chrome headless
    pub headless: bool,

    /// User agent override applied to every page
    pub user_agent: Option<String>,

    /// Viewport width
    pub window_width: u32,

    /// Viewport height
    pub window_height: u32,

    /// Login page of the target site
    pub login_url: String,

    /// Maximum concurrently open browser contexts
    pub max_contexts: usize,

    /// Overall budget for loading a page, retries included (ms)
    pub load_timeout: u64,

    /// Budget of a single load attempt (ms)
    pub attempt_timeout: u64,

    /// Budget for expanding one section (ms)
    pub expand_timeout: u64,

    /// Budget for scrolling one section into view (ms)
    pub scroll_timeout: u64,

    /// Budget for the whole login exchange (ms)
    pub login_timeout: u64,

    /// Interval between stabilization probes (ms)
    pub poll_interval: u64,

    /// Identical consecutive probes required to call a page stable
    pub settle_polls: u32,

    /// Retries after a transient load failure
    pub max_retries: u32,

    /// Pause before a retry (ms)
    pub retry_backoff: u64,

    /// Inject the stealth init script into new pages
    pub stealth_enabled: bool,

    /// Lower bound of human pacing pauses (ms)
    pub pacing_min: u64,

    /// Upper bound of human pacing pauses (ms)
    pub pacing_max: u64,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp_endpoint: "ws://localhost:9222".to_string(),
            chrome_path: None,
            chrome_port: 9222,
            headless: true,
            user_agent: None,
            window_width: 1920,
            window_height: 1080,
            login_url: "https://www.linkedin.com/login".to_string(),
            max_contexts: 4,
            load_timeout: 45_000,
            attempt_timeout: 20_000,
            expand_timeout: 15_000,
            scroll_timeout: 5_000,
            login_timeout: 45_000,
            poll_interval: 250,
            settle_polls: 2,
            max_retries: 2,
            retry_backoff: 1_000,
            stealth_enabled: true,
            pacing_min: 500,
            pacing_max: 1_500,
            log_level: "info".to_string(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::configuration(format!("Invalid {}", name))),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Config::default().merge_env()
    }

    /// Overlay `SCRAPER_*` environment variables on this configuration
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(endpoint) = env::var("SCRAPER_CDP_ENDPOINT") {
            self.cdp_endpoint = endpoint;
        }

        if let Ok(chrome_path) = env::var("SCRAPER_CHROME_PATH") {
            self.chrome_path = Some(chrome_path);
        }

        if let Some(port) = parse_env("SCRAPER_CHROME_PORT")? {
            self.chrome_port = port;
        }

        if let Some(headless) = parse_env("SCRAPER_HEADLESS")? {
            self.headless = headless;
        }

        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            self.user_agent = Some(user_agent);
        }

        if let Some(width) = parse_env("SCRAPER_WINDOW_WIDTH")? {
            self.window_width = width;
        }

        if let Some(height) = parse_env("SCRAPER_WINDOW_HEIGHT")? {
            self.window_height = height;
        }

        if let Ok(login_url) = env::var("SCRAPER_LOGIN_URL") {
            self.login_url = login_url;
        }

        if let Some(max_contexts) = parse_env("SCRAPER_MAX_CONTEXTS")? {
            self.max_contexts = max_contexts;
        }

        if let Some(timeout) = parse_env("SCRAPER_LOAD_TIMEOUT")? {
            self.load_timeout = timeout;
        }

        if let Some(timeout) = parse_env("SCRAPER_ATTEMPT_TIMEOUT")? {
            self.attempt_timeout = timeout;
        }

        if let Some(timeout) = parse_env("SCRAPER_EXPAND_TIMEOUT")? {
            self.expand_timeout = timeout;
        }

        if let Some(timeout) = parse_env("SCRAPER_SCROLL_TIMEOUT")? {
            self.scroll_timeout = timeout;
        }

        if let Some(timeout) = parse_env("SCRAPER_LOGIN_TIMEOUT")? {
            self.login_timeout = timeout;
        }

        if let Some(interval) = parse_env("SCRAPER_POLL_INTERVAL")? {
            self.poll_interval = interval;
        }

        if let Some(polls) = parse_env("SCRAPER_SETTLE_POLLS")? {
            self.settle_polls = polls;
        }

        if let Some(retries) = parse_env("SCRAPER_MAX_RETRIES")? {
            self.max_retries = retries;
        }

        if let Some(backoff) = parse_env("SCRAPER_RETRY_BACKOFF")? {
            self.retry_backoff = backoff;
        }

        if let Some(stealth) = parse_env("SCRAPER_STEALTH")? {
            self.stealth_enabled = stealth;
        }

        if let Some(pacing) = parse_env("SCRAPER_PACING_MIN")? {
            self.pacing_min = pacing;
        }

        if let Some(pacing) = parse_env("SCRAPER_PACING_MAX")? {
            self.pacing_max = pacing;
        }

        if let Ok(log_level) = env::var("SCRAPER_LOG_LEVEL") {
            self.log_level = log_level;
        }

        self.validate()
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()
    }

    /// Reject values that would make every wait or pipeline degenerate
    pub fn validate(self) -> Result<Self> {
        if self.max_contexts == 0 {
            return Err(Error::configuration("max_contexts must be at least 1"));
        }
        if self.settle_polls == 0 {
            return Err(Error::configuration("settle_polls must be at least 1"));
        }
        if self.pacing_min > self.pacing_max {
            return Err(Error::configuration("pacing_min exceeds pacing_max"));
        }
        Ok(self)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout)
    }
}

/// Login credentials for one authentication attempt
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new<E: Into<String>, P: Into<String>>(email: E, password: P) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials, preferring explicit values over
    /// `LINKEDIN_EMAIL` / `LINKEDIN_PASSWORD`.
    pub fn resolve(email: Option<String>, password: Option<String>) -> std::result::Result<Self, AuthError> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .or_else(|| env::var("LINKEDIN_EMAIL").ok());
        let password = password
            .filter(|p| !p.is_empty())
            .or_else(|| env::var("LINKEDIN_PASSWORD").ok());

        match (email, password) {
            (Some(email), Some(password)) => {
                let credentials = Self::new(email.trim(), password);
                credentials.validate()?;
                Ok(credentials)
            }
            _ => Err(AuthError::MissingCredentials),
        }
    }

    /// Both fields must be non-empty
    pub fn validate(&self) -> std::result::Result<(), AuthError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
