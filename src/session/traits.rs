//! Session management traits
//!
//! Abstract interfaces over an isolated browser context and its page. The
//! navigator and the session controller only ever talk to these traits, so a
//! scripted site can stand in for Chrome in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::Config;

/// Options applied when opening a browser context
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Headless mode (only used when the launcher starts Chrome)
    pub headless: bool,
    /// Viewport width
    pub window_width: u32,
    /// Viewport height
    pub window_height: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Install the stealth init script on new pages
    pub stealth: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: None,
            stealth: true,
        }
    }
}

impl From<&Config> for BrowserOptions {
    fn from(config: &Config) -> Self {
        Self {
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
            user_agent: config.user_agent.clone(),
            stealth: config.stealth_enabled,
        }
    }
}

/// A CSS selector, optionally narrowed to elements whose visible text
/// contains a needle (case-insensitive)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Locator {
    pub fn css<S: Into<String>>(css: S) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Text filter check shared by every page implementation
    pub fn text_matches(&self, visible_text: &str) -> bool {
        match &self.text {
            Some(needle) => visible_text.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} containing \"{}\"", self.css, text),
            None => f.write_str(&self.css),
        }
    }
}

/// What the page reports about the first element matching a locator
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ElementInfo {
    pub tag: String,
    #[serde(default)]
    pub text: String,
    /// Raw `href` attribute, unresolved
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// One sample of the page's loading state
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProbe {
    pub url: String,
    pub ready_state: String,
    /// At least one of the probed landmarks is in the DOM
    pub landmark_present: bool,
    pub node_count: u64,
    pub resource_count: u64,
}

impl PageProbe {
    pub fn is_complete(&self) -> bool {
        self.ready_state == "complete"
    }

    /// Values that must stop changing before the page counts as settled
    pub fn fingerprint(&self) -> (u64, u64) {
        (self.node_count, self.resource_count)
    }
}

/// Browser context trait
///
/// One isolated cookie jar holding a single page.
#[async_trait]
pub trait BrowserContext: Send + Sync + fmt::Debug {
    /// Get context ID
    fn id(&self) -> &str;

    /// The page attached to this context
    fn page(&self) -> Arc<dyn PageContext>;

    /// Close the context and every page in it
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if context is active
    fn is_active(&self) -> bool;
}

/// Page context trait
///
/// Every DOM interaction the scraper performs goes through these calls.
#[async_trait]
pub trait PageContext: Send + Sync + fmt::Debug {
    /// Get page ID
    fn id(&self) -> &str;

    /// Start navigating to URL; does not wait for the page to settle
    async fn navigate(&self, url: &str) -> Result<(), crate::Error>;

    /// Current document URL
    async fn current_url(&self) -> Result<String, crate::Error>;

    /// Serialized DOM of the current document
    async fn content(&self) -> Result<String, crate::Error>;

    /// Sample readiness, landmark presence and DOM activity
    async fn probe(&self, landmarks: &[Locator]) -> Result<PageProbe, crate::Error>;

    /// First element matching the locator
    async fn find(&self, locator: &Locator) -> Result<Option<ElementInfo>, crate::Error>;

    /// Click the first match; false when nothing matched
    async fn click(&self, locator: &Locator) -> Result<bool, crate::Error>;

    /// Click every match; returns how many were clicked
    async fn click_all(&self, locator: &Locator) -> Result<usize, crate::Error>;

    /// Set an input's value; false when nothing matched
    async fn fill(&self, locator: &Locator, value: &str) -> Result<bool, crate::Error>;

    /// Scroll the first match into view; false when nothing matched
    async fn scroll_into_view(&self, locator: &Locator) -> Result<bool, crate::Error>;

    /// Run `source` before any page script on every new document
    async fn add_init_script(&self, source: &str) -> Result<(), crate::Error>;

    /// Close the page
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if page is active
    fn is_active(&self) -> bool;
}

/// Opens isolated browser contexts
#[async_trait]
pub trait ContextFactory: Send + Sync + fmt::Debug {
    async fn open_context(&self, options: &BrowserOptions) -> Result<Arc<dyn BrowserContext>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_text_filter_is_case_insensitive() {
        let locator = Locator::css("a").with_text("Show all");
        assert!(locator.text_matches("  show ALL 12 experiences "));
        assert!(!locator.text_matches("Show more"));
        assert!(Locator::css("a").text_matches("anything"));
    }

    #[test]
    fn test_probe_deserializes_from_page_json() {
        let probe: PageProbe = serde_json::from_str(
            r#"{"url":"https://x/","readyState":"complete","landmarkPresent":true,"nodeCount":120,"resourceCount":9}"#,
        )
        .unwrap();
        assert!(probe.is_complete());
        assert_eq!(probe.fingerprint(), (120, 9));
    }

    #[test]
    fn test_locator_display() {
        let locator = Locator::css("button").with_text("more");
        assert_eq!(locator.to_string(), "button containing \"more\"");
    }
}
