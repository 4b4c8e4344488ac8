//! Browser context implementation
//!
//! Wraps one CDP browser context and its single page target.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cdp::traits::{CdpBrowser, CdpClient};
use crate::session::page::PageContextImpl;
use crate::session::traits::{BrowserContext, BrowserOptions, ContextFactory, PageContext};
use crate::Error;

/// Browser context implementation
#[derive(Debug)]
pub struct BrowserContextImpl {
    id: String,
    cdp_browser: Arc<dyn CdpBrowser>,
    page: Arc<PageContextImpl>,
    is_active: AtomicBool,
}

impl BrowserContextImpl {
    pub fn new(context_id: String, cdp_browser: Arc<dyn CdpBrowser>, page: Arc<PageContextImpl>) -> Self {
        Self {
            id: context_id,
            cdp_browser,
            page,
            is_active: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl BrowserContext for BrowserContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn page(&self) -> Arc<dyn PageContext> {
        self.page.clone()
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.page.close().await {
            debug!("Page of context {} already closed: {}", self.id, e);
        }
        self.cdp_browser.dispose_context(&self.id).await
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

/// Opens isolated contexts on a Chrome reachable over CDP
#[derive(Debug)]
pub struct CdpContextFactory {
    cdp_browser: Arc<dyn CdpBrowser>,
}

impl CdpContextFactory {
    pub fn new(cdp_browser: Arc<dyn CdpBrowser>) -> Self {
        Self { cdp_browser }
    }

    async fn apply_options(client: &Arc<dyn CdpClient>, options: &BrowserOptions) -> Result<(), Error> {
        client
            .call_method(
                "Emulation.setDeviceMetricsOverride",
                json!({
                    "width": options.window_width,
                    "height": options.window_height,
                    "deviceScaleFactor": 1,
                    "mobile": false
                }),
            )
            .await?;

        if let Some(user_agent) = options.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
            client.enable_domain("Network").await?;
            client
                .call_method("Network.setUserAgentOverride", json!({ "userAgent": user_agent }))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContextFactory for CdpContextFactory {
    async fn open_context(&self, options: &BrowserOptions) -> Result<Arc<dyn BrowserContext>, Error> {
        let target = self.cdp_browser.open_context().await?;

        if let Err(e) = Self::apply_options(&target.client, options).await {
            if let Err(dispose_err) = self.cdp_browser.dispose_context(&target.context_id).await {
                warn!("Failed to dispose context {} after setup failure: {}", target.context_id, dispose_err);
            }
            return Err(e);
        }

        info!("Opened isolated browser context {}", target.context_id);

        let page = Arc::new(PageContextImpl::new(target.client));
        Ok(Arc::new(BrowserContextImpl::new(
            target.context_id,
            Arc::clone(&self.cdp_browser),
            page,
        )))
    }
}
