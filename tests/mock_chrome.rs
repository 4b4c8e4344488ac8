//! Mock Chrome DevTools Protocol server
//!
//! A WebSocket endpoint that answers the page-level commands the scraper
//! sends, serving one fixed document. Used to exercise the real CDP
//! connection and page implementation without a browser.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Mock Chrome server
pub struct MockChromeServer {
    addr: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockChromeServer {
    /// Start a server whose page always renders `html`
    pub async fn start(html: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let ws_addr = format!("ws://{}/devtools/page/MOCK", addr);
        let html = html.to_string();

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer_addr)) => {
                                tracing::info!("Mock Chrome: Connection from {}", peer_addr);
                                tokio::spawn(Self::handle_connection(stream, html.clone()));
                            }
                            Err(e) => {
                                tracing::error!("Mock Chrome: Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Mock Chrome: Shutdown signal received");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            addr: ws_addr,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    async fn handle_connection(stream: TcpStream, html: String) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws_stream) => ws_stream,
            Err(e) => {
                tracing::error!("Mock Chrome: WebSocket handshake error: {}", e);
                return;
            }
        };
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let mut page = PageState {
            url: "about:blank".to_string(),
            html,
        };

        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let Ok(req) = serde_json::from_str::<Value>(&text) else { continue };
                    let response = page.respond(&req);
                    if ws_sender.send(Message::Text(response.to_string())).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::error!("Mock Chrome: WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    }

    /// WebSocket URL of the mock page target
    pub fn ws_endpoint(&self) -> &str {
        &self.addr
    }
}

impl Drop for MockChromeServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// What one page connection has navigated to
struct PageState {
    url: String,
    html: String,
}

fn string_result(id: i64, value: &str) -> Value {
    json!({ "id": id, "result": { "result": { "type": "string", "value": value } } })
}

impl PageState {
    fn respond(&mut self, req: &Value) -> Value {
        let id = req.get("id").and_then(|i| i.as_i64()).unwrap_or(0);
        let method = req.get("method").and_then(|m| m.as_str()).unwrap_or("unknown");

        match method {
            "Page.enable" | "Runtime.enable" => json!({ "id": id, "result": {} }),
            "Page.addScriptToEvaluateOnNewDocument" => json!({ "id": id, "result": { "identifier": "1" } }),
            "Page.navigate" => {
                let url = req["params"]["url"].as_str().unwrap_or_default();
                if url.contains("unreachable") {
                    return json!({ "id": id, "result": { "frameId": "F1", "errorText": "net::ERR_NAME_NOT_RESOLVED" } });
                }
                self.url = url.to_string();
                json!({ "id": id, "result": { "frameId": "F1", "loaderId": "L1" } })
            }
            "Runtime.evaluate" => {
                let expr = req["params"]["expression"].as_str().unwrap_or_default();
                if expr == "location.href" {
                    string_result(id, &self.url)
                } else if expr.contains("outerHTML") {
                    string_result(id, &self.html)
                } else if expr.contains("readyState") {
                    let probe = json!({
                        "url": self.url,
                        "readyState": "complete",
                        "landmarkPresent": true,
                        "nodeCount": 12,
                        "resourceCount": 0
                    });
                    string_result(id, &probe.to_string())
                } else if expr.contains("nodes.forEach") {
                    json!({ "id": id, "result": { "result": { "type": "number", "value": 2 } } })
                } else if expr.contains("throw") {
                    json!({ "id": id, "result": {
                        "result": { "type": "object" },
                        "exceptionDetails": { "exceptionId": 1, "text": "Uncaught", "lineNumber": 0, "columnNumber": 0 }
                    } })
                } else {
                    json!({ "id": id, "result": { "result": { "type": "boolean", "value": true } } })
                }
            }
            _ => json!({
                "id": id,
                "error": { "code": -32601, "message": format!("'{}' wasn't found", method) }
            }),
        }
    }
}
