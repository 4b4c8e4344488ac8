//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a Chrome DevTools Protocol target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// High-level CDP client that provides typed methods for the operations the
/// scraper needs.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection>;

    /// Start a navigation; does not wait for the page to settle
    async fn navigate(&self, url: &str) -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Register a script that runs before any page script on every new document
    async fn add_init_script(&self, source: &str) -> Result<String, crate::Error>;

    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Frame that navigated
    pub frame_id: Option<String>,
    /// Loader ID of the new document
    pub loader_id: Option<String>,
    /// Requested URL
    pub url: String,
}

/// JavaScript evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

impl EvaluationResult {
    /// Interpret the result as JSON, decoding string payloads produced by
    /// `JSON.stringify` on the page side.
    pub fn into_json(self) -> Result<Value, crate::Error> {
        match self {
            EvaluationResult::String(s) => Ok(serde_json::from_str(&s)?),
            EvaluationResult::Object(v) => Ok(v),
            EvaluationResult::Number(n) => Ok(serde_json::json!(n)),
            EvaluationResult::Bool(b) => Ok(Value::Bool(b)),
            EvaluationResult::Null => Ok(Value::Null),
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, EvaluationResult::Bool(true))
    }
}

/// An isolated browser context with one attached page target
#[derive(Debug, Clone)]
pub struct CdpTarget {
    /// Browser context ID (cookie jar boundary)
    pub context_id: String,
    /// Page target ID
    pub target_id: String,
    /// Client bound to the page target
    pub client: Arc<dyn CdpClient>,
}

/// CDP browser trait
///
/// Controls browser-level operations via CDP.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Create an isolated browser context holding a single blank page
    async fn open_context(&self) -> Result<CdpTarget, crate::Error>;

    /// Dispose a browser context and every target inside it
    async fn dispose_context(&self, context_id: &str) -> Result<(), crate::Error>;

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, crate::Error>;

    /// Close all connections held by this controller
    async fn close(&self) -> Result<(), crate::Error>;
}

/// Browser version information
#[derive(Debug, Clone)]
pub struct BrowserVersion {
    /// Protocol version
    pub protocol_version: String,
    /// Product name
    pub product: String,
    /// User agent
    pub user_agent: String,
    /// Browser-level WebSocket debugger URL
    pub ws_debugger_url: String,
}
