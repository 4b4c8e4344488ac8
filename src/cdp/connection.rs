//! CDP WebSocket connection implementation
//!
//! One connection per DevTools target. The socket is split: writers share the
//! sink behind a mutex, a single reader task owns the stream and routes each
//! response to the oneshot channel registered under its command ID.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<std::sync::Mutex<HashMap<u64, PendingCommand>>>;

/// Per-command round-trip budgets
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    default_timeout: Duration,
    navigation_timeout: Duration,
    execution_timeout: Duration,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpTimeoutConfig {
    fn timeout_for(&self, method: &str) -> Duration {
        if method.starts_with("Page.navigate") || method.starts_with("Page.reload") {
            return self.navigation_timeout;
        }
        if method.starts_with("Runtime.") {
            return self.execution_timeout;
        }
        self.default_timeout
    }
}

#[derive(Debug)]
struct PendingCommand {
    sender: oneshot::Sender<CdpResponse>,
    method: String,
}

/// CDP WebSocket connection implementation
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    url: String,
    sink: Mutex<SplitSink<WsStream, Message>>,
    next_id: AtomicU64,
    pending: PendingMap,
    is_active: Arc<AtomicBool>,
    timeouts: CdpTimeoutConfig,
}

impl CdpWebSocketConnection {
    /// Connect to a DevTools WebSocket URL
    /// (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn connect<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        debug!("Connecting to WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;
        let (sink, stream) = ws_stream.split();

        let pending: PendingMap = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let is_active = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&pending),
            Arc::clone(&is_active),
            url.clone(),
        ));

        info!("WebSocket connection established: {}", url);

        Ok(Arc::new(Self {
            url,
            sink: Mutex::new(sink),
            next_id: AtomicU64::new(1),
            pending,
            is_active,
            timeouts: CdpTimeoutConfig::default(),
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn read_loop(
        mut stream: SplitStream<WsStream>,
        pending: PendingMap,
        is_active: Arc<AtomicBool>,
        url: String,
    ) {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, &pending),
                Ok(Message::Close(_)) => {
                    debug!("WebSocket close frame received from {}", url);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error on {}: {}", url, e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);
        // Dropping the senders wakes every waiter with a closed-channel error.
        if let Ok(mut pending) = pending.lock() {
            pending.clear();
        }
        debug!("Reader task for {} exited", url);
    }

    fn dispatch(text: &str, pending: &PendingMap) {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            let waiter = pending.lock().ok().and_then(|mut p| p.remove(&response.id));
            match waiter {
                Some(cmd) => {
                    trace!("Response for command {} ({})", response.id, cmd.method);
                    let _ = cmd.sender.send(CdpResponse {
                        id: response.id,
                        result: Some(response.result),
                        error: response.error.map(|e| CdpErrorResponse {
                            code: e.code,
                            message: e.message,
                            data: e.data,
                        }),
                    });
                }
                None => warn!("Received response for unknown command ID: {}", response.id),
            }
            return;
        }

        if let Ok(notification) = serde_json::from_str::<CdpNotification>(text) {
            trace!("Event: {}", notification.method);
            return;
        }

        warn!("Unknown message format: {}", text);
    }

    fn forget(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active() {
            return Err(Error::websocket(format!("Connection to {} is not active", self.url)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
        };
        let json = serde_json::to_string(&request)?;

        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| Error::internal("pending command table poisoned"))?
            .insert(
                id,
                PendingCommand {
                    sender,
                    method: method.to_string(),
                },
            );

        debug!("Sending CDP command {}: {}", id, method);
        let sent = self.sink.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            self.forget(id);
            return Err(Error::websocket(format!("Failed to send {}: {}", method, e)));
        }

        match tokio::time::timeout(self.timeouts.timeout_for(method), receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!("{}: {} (code: {})", method, error.message, error.code)));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!("Connection closed while waiting for {}", method))),
            Err(_) => {
                self.forget(id);
                Err(Error::timeout(format!("Command {} ({}) timed out", id, method)))
            }
        }
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Closing CDP WebSocket connection {}", self.url);

        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_selection_by_method() {
        let config = CdpTimeoutConfig::default();
        assert_eq!(config.timeout_for("Page.navigate"), Duration::from_secs(60));
        assert_eq!(config.timeout_for("Runtime.evaluate"), Duration::from_secs(30));
        assert_eq!(config.timeout_for("Target.createTarget"), Duration::from_secs(30));
    }

    #[test]
    fn test_dispatch_routes_response_to_waiter() {
        let pending: PendingMap = Arc::new(std::sync::Mutex::new(HashMap::new()));
        let (sender, mut receiver) = oneshot::channel();
        pending.lock().unwrap().insert(
            7,
            PendingCommand {
                sender,
                method: "Runtime.evaluate".to_string(),
            },
        );

        CdpWebSocketConnection::dispatch(r#"{"id":7,"result":{"ok":true}}"#, &pending);

        let response = receiver.try_recv().unwrap();
        assert_eq!(response.id, 7);
        assert_eq!(response.result.unwrap()["ok"], true);
        assert!(pending.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_ignores_events() {
        let pending: PendingMap = Arc::new(std::sync::Mutex::new(HashMap::new()));
        CdpWebSocketConnection::dispatch(r#"{"method":"Page.loadEventFired","params":{}}"#, &pending);
        assert!(pending.lock().unwrap().is_empty());
    }
}
