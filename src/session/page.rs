//! Page context implementation
//!
//! Maps each page operation onto a `Runtime.evaluate` round trip.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::cdp::traits::{CdpClient, EvaluationResult};
use crate::session::scripts;
use crate::session::traits::{ElementInfo, Locator, PageContext, PageProbe};
use crate::Error;

/// Page context implementation
#[derive(Debug)]
pub struct PageContextImpl {
    id: String,
    cdp_client: Arc<dyn CdpClient>,
    is_active: AtomicBool,
}

impl PageContextImpl {
    pub fn new(cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cdp_client,
            is_active: AtomicBool::new(true),
        }
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::page_closed(&self.id))
        }
    }

    async fn eval(&self, script: &str) -> Result<EvaluationResult, Error> {
        self.ensure_active()?;
        self.cdp_client.evaluate(script, false).await
    }

    async fn eval_string(&self, script: &str) -> Result<String, Error> {
        match self.eval(script).await? {
            EvaluationResult::String(s) => Ok(s),
            EvaluationResult::Null => Ok(String::new()),
            other => Err(Error::script_execution_failed(format!("expected string, got {:?}", other))),
        }
    }

    async fn eval_bool(&self, script: &str) -> Result<bool, Error> {
        Ok(self.eval(script).await?.as_bool())
    }
}

#[async_trait]
impl PageContext for PageContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), Error> {
        self.ensure_active()?;
        self.cdp_client.navigate(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Error> {
        self.eval_string(scripts::CURRENT_URL).await
    }

    async fn content(&self) -> Result<String, Error> {
        self.eval_string(scripts::CONTENT).await
    }

    async fn probe(&self, landmarks: &[Locator]) -> Result<PageProbe, Error> {
        let json = self.eval_string(&scripts::probe(landmarks)?).await?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementInfo>, Error> {
        match self.eval(&scripts::find(locator)?).await? {
            EvaluationResult::String(json) => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }

    async fn click(&self, locator: &Locator) -> Result<bool, Error> {
        self.eval_bool(&scripts::click(locator)?).await
    }

    async fn click_all(&self, locator: &Locator) -> Result<usize, Error> {
        match self.eval(&scripts::click_all(locator)?).await? {
            EvaluationResult::Number(n) if n > 0.0 => Ok(n as usize),
            _ => Ok(0),
        }
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<bool, Error> {
        self.eval_bool(&scripts::fill(locator, value)?).await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<bool, Error> {
        self.eval_bool(&scripts::scroll_into_view(locator)?).await
    }

    async fn add_init_script(&self, source: &str) -> Result<(), Error> {
        self.ensure_active()?;
        self.cdp_client.add_init_script(source).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        if self.is_active.swap(false, Ordering::SeqCst) {
            self.cdp_client.connection().close().await?;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst) && self.cdp_client.connection().is_active()
    }
}
