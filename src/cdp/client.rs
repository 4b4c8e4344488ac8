//! CDP client implementation
//!
//! Typed wrappers over the raw command channel of one page target.

use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Convert a remote object returned by value into an evaluation result
    fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
            "number" => EvaluationResult::Number(obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0)),
            "boolean" => EvaluationResult::Bool(obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false)),
            "object" => match &obj.value {
                Some(serde_json::Value::Null) | None => EvaluationResult::Null,
                Some(value) => EvaluationResult::Object(value.clone()),
            },
            _ => EvaluationResult::Null,
        }
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        debug!("Page.navigate {}", url);

        let params = NavigateParams {
            url: url.to_string(),
            referrer: None,
        };
        let result = self.call_method("Page.navigate", serde_json::to_value(params)?).await?;
        let response: NavigateResponse = serde_json::from_value(result).unwrap_or_default();

        if let Some(error_text) = response.error_text.filter(|t| !t.is_empty()) {
            return Err(Error::cdp(format!("navigation to {} failed: {}", url, error_text)));
        }

        Ok(NavigationResult {
            frame_id: response.frame_id,
            loader_id: response.loader_id,
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
        };

        let result = self.call_method("Runtime.evaluate", serde_json::to_value(params)?).await?;
        let response: EvaluateResponse = serde_json::from_value(result)?;

        if let Some(exception) = response.exception_details {
            return Err(Error::script_execution_failed(exception.message()));
        }

        Ok(Self::parse_remote_object(&response.result))
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.call_method(&format!("{}.enable", domain), json!({})).await?;
        Ok(())
    }

    async fn add_init_script(&self, source: &str) -> Result<String, Error> {
        let result = self
            .call_method("Page.addScriptToEvaluateOnNewDocument", json!({ "source": source }))
            .await?;

        Ok(result
            .get("identifier")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        let response = self.connection.send_command(method, params).await?;
        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }
}
