//! CDP client over one WebSocket.
//!
//! Request/response matching via id, events broadcast to subscribers.
//! Every command round-trip is bounded: a browser that stops answering
//! surfaces as `CdpError::Timeout`, never as a hung caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::protocol::{CdpMessage, CdpRequest, CdpResponse, RequestId, SessionId};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Bound for a single command round-trip.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("javascript exception: {0}")]
    JsException(String),

    #[error("command {method} timed out")]
    Timeout { method: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("connection closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, CdpError>;

/// Event subscriber callback.
pub type EventCallback = Arc<dyn Fn(super::protocol::CdpEvent) + Send + Sync>;

/// Client for one browser's DevTools WebSocket.
pub struct CdpClient {
    next_id: AtomicU64,

    /// Requests awaiting a response, keyed by request id.
    pending: Arc<DashMap<RequestId, oneshot::Sender<CdpResponse>>>,

    /// Event subscribers keyed by method name (e.g. "Page.loadEventFired").
    subscribers: Arc<DashMap<String, Vec<EventCallback>>>,

    sink: RwLock<WsSink>,
}

impl CdpClient {
    /// Connect to a DevTools WebSocket endpoint and start the reader task.
    pub async fn connect(ws_url: &str) -> Result<Arc<Self>> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (sink, mut stream) = ws_stream.split();

        let client = Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            subscribers: Arc::new(DashMap::new()),
            sink: RwLock::new(sink),
        });

        let reader = Arc::clone(&client);
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = reader.handle_message(&text) {
                            tracing::error!(error = %e, "failed to handle CDP message");
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("devtools websocket closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "devtools websocket error");
                        break;
                    }
                    _ => {}
                }
            }
            // Dropping the senders wakes every in-flight call with Closed.
            reader.pending.clear();
        });

        Ok(client)
    }

    /// Send a command and wait for its response.
    pub async fn send(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Result<Value> {
        let method = method.into();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.clone(),
            params,
            session_id,
        };

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let json = serde_json::to_string(&request)?;
        {
            let mut sink = self.sink.write().await;
            if let Err(e) = sink.send(Message::Text(json)).await {
                self.pending.remove(&id);
                return Err(CdpError::WebSocket(e));
            }
        }

        let response = match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(CdpError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                return Err(CdpError::Timeout { method });
            }
        };

        if let Some(error) = response.error {
            return Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Subscribe to events by method name.
    pub fn subscribe(&self, method: impl Into<String>, callback: EventCallback) {
        self.subscribers
            .entry(method.into())
            .or_default()
            .push(callback);
    }

    fn handle_message(&self, text: &str) -> Result<()> {
        let msg: CdpMessage = serde_json::from_str(text)?;

        match msg {
            CdpMessage::Response(response) => {
                if let Some((_, tx)) = self.pending.remove(&response.id) {
                    let _ = tx.send(response); // receiver may have given up
                } else {
                    tracing::warn!(id = response.id, "response for unknown request");
                }
            }
            CdpMessage::Event(event) => {
                if let Some(subscribers) = self.subscribers.get(&event.method) {
                    for callback in subscribers.value() {
                        callback(event.clone());
                    }
                }
            }
        }

        Ok(())
    }

    /// Close the connection. In-flight requests fail with `Closed`.
    pub async fn close(&self) -> Result<()> {
        let mut sink = self.sink.write().await;
        sink.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // needs a running Chromium with an open devtools port
    async fn connect_and_query_version() {
        let client = CdpClient::connect("ws://localhost:9222/devtools/browser")
            .await
            .unwrap();

        let result = client.send("Browser.getVersion", None, None).await.unwrap();
        assert!(result.get("product").is_some());
    }
}
