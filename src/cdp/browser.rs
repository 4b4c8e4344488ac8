//! CDP browser control implementation
//!
//! Browser-level operations: discovery over the HTTP endpoints, isolated
//! browser contexts over the browser WebSocket, one page connection per context.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    /// Browser-level connection, opened on first use
    browser_connection: Mutex<Option<Arc<dyn CdpConnection>>>,
    /// Page connections by browser context ID
    page_connections: Mutex<HashMap<String, Arc<dyn CdpConnection>>>,
}

impl CdpBrowserImpl {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        info!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            browser_connection: Mutex::new(None),
            page_connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP base of the DevTools endpoint
    fn http_base(&self) -> String {
        self.ws_base()
            .replace("ws://", "http://")
            .replace("wss://", "https://")
    }

    /// WebSocket base of the DevTools endpoint, without any path
    fn ws_base(&self) -> String {
        let base = self
            .endpoint
            .trim_end_matches('/')
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        match base.find("/devtools/") {
            Some(idx) => base[..idx].to_string(),
            None => base,
        }
    }

    fn page_ws_url(&self, target_id: &str) -> String {
        format!("{}/devtools/page/{}", self.ws_base(), target_id)
    }

    async fn browser_connection(&self) -> Result<Arc<dyn CdpConnection>, Error> {
        let mut guard = self.browser_connection.lock().await;
        if let Some(connection) = guard.as_ref().filter(|c| c.is_active()) {
            return Ok(Arc::clone(connection));
        }

        let version = self.get_version().await?;
        let connection: Arc<dyn CdpConnection> = CdpWebSocketConnection::connect(version.ws_debugger_url).await?;
        *guard = Some(Arc::clone(&connection));
        Ok(connection)
    }

    fn string_field(value: &serde_json::Value, key: &str) -> Result<String, Error> {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::cdp(format!("missing {} in response", key)))
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    async fn open_context(&self) -> Result<CdpTarget, Error> {
        let browser = self.browser_connection().await?;

        let created = browser
            .send_command("Target.createBrowserContext", json!({ "disposeOnDetach": true }))
            .await?;
        let context_id = Self::string_field(&created.result.unwrap_or_default(), "browserContextId")?;

        let target = browser
            .send_command(
                "Target.createTarget",
                json!({ "url": "about:blank", "browserContextId": context_id }),
            )
            .await;
        let target_id = match target {
            Ok(response) => Self::string_field(&response.result.unwrap_or_default(), "targetId")?,
            Err(e) => {
                let _ = browser
                    .send_command("Target.disposeBrowserContext", json!({ "browserContextId": context_id }))
                    .await;
                return Err(e);
            }
        };

        let page_connection = CdpWebSocketConnection::connect(self.page_ws_url(&target_id)).await?;
        self.page_connections
            .lock()
            .await
            .insert(context_id.clone(), page_connection.clone());

        let client = Arc::new(CdpClientImpl::new(page_connection));
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        debug!("Opened browser context {} with page {}", context_id, target_id);

        Ok(CdpTarget {
            context_id,
            target_id,
            client,
        })
    }

    async fn dispose_context(&self, context_id: &str) -> Result<(), Error> {
        if let Some(page) = self.page_connections.lock().await.remove(context_id) {
            if let Err(e) = page.close().await {
                debug!("Page connection for {} already gone: {}", context_id, e);
            }
        }

        let browser = self.browser_connection().await?;
        browser
            .send_command("Target.disposeBrowserContext", json!({ "browserContextId": context_id }))
            .await?;

        debug!("Disposed browser context {}", context_id);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let url = format!("{}/json/version", self.http_base());
        debug!("Fetching browser version from {}", url);

        let version_json: serde_json::Value = reqwest::get(&url)
            .await
            .map_err(|e| {
                Error::websocket(format!(
                    "Failed to reach Chrome at {} (start it with --remote-debugging-port): {}",
                    self.endpoint, e
                ))
            })?
            .json()
            .await
            .map_err(|e| Error::cdp(format!("Failed to parse version: {}", e)))?;

        let field = |key: &str| {
            version_json
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        };

        Ok(BrowserVersion {
            protocol_version: field("Protocol-Version"),
            product: field("Browser"),
            user_agent: field("User-Agent"),
            ws_debugger_url: Self::string_field(&version_json, "webSocketDebuggerUrl")?,
        })
    }

    async fn close(&self) -> Result<(), Error> {
        let pages: Vec<_> = self.page_connections.lock().await.drain().collect();
        for (context_id, connection) in pages {
            if let Err(e) = connection.close().await {
                warn!("Failed to close page connection for {}: {}", context_id, e);
            }
        }

        if let Some(browser) = self.browser_connection.lock().await.take() {
            browser.close().await?;
        }
        Ok(())
    }
}
