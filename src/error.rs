//! Unified error types for Profile-Oxide

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Profile-Oxide
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser context not found or already closed
    #[error("Browser context closed: {0}")]
    ContextClosed(String),

    /// Page not found or already closed
    #[error("Page closed: {0}")]
    PageClosed(String),

    /// Timeout of a single protocol round trip
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Navigation failed after retries
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The profile could not be scraped at all
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new context closed error
    pub fn context_closed<S: Into<String>>(id: S) -> Self {
        Error::ContextClosed(id.into())
    }

    /// Create a new page closed error
    pub fn page_closed<S: Into<String>>(id: S) -> Self {
        Error::PageClosed(id.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether a retry of the same browser operation might succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::WebSocket(_) | Error::Cdp(_) | Error::Io(_)
        )
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 2,
            _ => 1,
        }
    }
}

/// Authentication failures, kept distinct so callers can tell a bad password
/// from a verification wall from a flaky network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// No usable email/password pair was supplied
    #[error("credentials are required (pass --email/--password or set LINKEDIN_EMAIL/LINKEDIN_PASSWORD)")]
    MissingCredentials,

    /// The login page rejected the credentials
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The site demanded an extra verification step
    #[error("verification challenge required at {url}")]
    Challenge { url: String },

    /// The login page could not be reached or never settled
    #[error("login failed at {stage}: {reason}")]
    Network { stage: String, reason: String },
}

/// Which Navigator operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStage {
    Load,
    Expand,
    Scroll,
}

impl fmt::Display for NavigationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavigationStage::Load => "load",
            NavigationStage::Expand => "expand",
            NavigationStage::Scroll => "scroll",
        };
        f.write_str(s)
    }
}

/// Why a navigation stage gave up
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationFailure {
    /// The deadline elapsed before the page stabilized
    Timeout,
    /// The caller cancelled the wait
    Cancelled,
    /// The browser reported an error
    Browser(String),
}

impl fmt::Display for NavigationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationFailure::Timeout => f.write_str("deadline exceeded"),
            NavigationFailure::Cancelled => f.write_str("cancelled"),
            NavigationFailure::Browser(msg) => write!(f, "browser error: {}", msg),
        }
    }
}

/// Navigation failure with enough context to tell the stage apart
#[derive(Error, Debug, Clone, PartialEq)]
#[error("navigation {stage} failed for {url} after {attempts} attempt(s): {reason}")]
pub struct NavigationError {
    pub stage: NavigationStage,
    pub url: String,
    pub reason: NavigationFailure,
    pub attempts: u32,
}

impl NavigationError {
    pub fn new<S: Into<String>>(stage: NavigationStage, url: S, reason: NavigationFailure) -> Self {
        Self {
            stage,
            url: url.into(),
            reason,
            attempts: 1,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.reason == NavigationFailure::Timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason == NavigationFailure::Cancelled
    }
}

/// Whole-scrape failures that are not authentication or navigation problems
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrapeError {
    /// The URL does not look like a profile page
    #[error("not a profile URL: {0}")]
    InvalidProfileUrl(String),

    /// The identity section could not be read, so the right page is not confirmed
    #[error("identity unavailable for {url} (wrong page or layout changed): {reason}")]
    IdentityUnavailable { url: String, reason: String },
}

/// Structural failure inside one section extractor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// The DOM no longer matches the expected layout
    #[error("unexpected layout in {section}: {detail}")]
    Layout { section: String, detail: String },

    /// A selector constant failed to parse
    #[error("invalid selector `{0}`")]
    Selector(String),
}

impl ExtractError {
    pub fn layout<S: Into<String>, D: Into<String>>(section: S, detail: D) -> Self {
        ExtractError::Layout {
            section: section.into(),
            detail: detail.into(),
        }
    }
}
