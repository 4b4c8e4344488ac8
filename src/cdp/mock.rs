//! Mock CDP implementation for testing
//!
//! A scripted connection: each method answers with the last result registered
//! for it, or `{}` when nothing was registered. Every command is recorded.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::cdp::traits::*;
use crate::Error;

/// Mock CDP connection
#[derive(Debug)]
pub struct MockCdpConnection {
    is_active: AtomicBool,
    next_id: AtomicU64,
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, String>>,
    sent: Mutex<Vec<(String, Value)>>,
}

impl MockCdpConnection {
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Answer `method` with `result`
    pub fn respond<S: Into<String>>(&self, method: S, result: Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(method.into(), result);
        }
    }

    /// Answer `method` with a protocol error
    pub fn fail<S: Into<String>, M: Into<String>>(&self, method: S, message: M) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(method.into(), message.into());
        }
    }

    /// Methods sent so far, in order
    pub fn sent_methods(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Parameters of the most recent call to `method`
    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is closed"));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push((method.to_string(), params));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Some(message) = self.failures.lock().ok().and_then(|f| f.get(method).cloned()) {
            return Err(Error::cdp(format!("{}: {} (code: -32000)", method, message)));
        }

        let result = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(method).cloned())
            .unwrap_or_else(|| serde_json::json!({}));

        Ok(CdpResponse {
            id,
            result: Some(result),
            error: None,
        })
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}
