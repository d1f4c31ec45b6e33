//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::error::CdpError;
use crate::protocol::{active_page, BrowserVersion, CdpRequest, CdpResponse, PageInfo};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// CDP client connected to the browser-level WebSocket endpoint.
///
/// Page-level commands are routed through flattened target sessions, so a
/// single connection serves every tab.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: url::Url,
    /// Browser version reported at connect time.
    version: BrowserVersion,
    /// WebSocket sender.
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    /// Request ID counter.
    request_id: AtomicU64,
    /// Pending requests waiting for responses.
    pending: PendingMap,
    /// Upper bound for a single command round trip.
    command_timeout: Duration,
    /// Background task handle.
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser at the given debugging endpoint.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("http://localhost:9222").await?;
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        Self::connect_with_timeout(endpoint, DEFAULT_COMMAND_TIMEOUT).await
    }

    /// Connect with an explicit per-command timeout.
    pub async fn connect_with_timeout(
        endpoint: &str,
        command_timeout: Duration,
    ) -> Result<Self, CdpError> {
        let http_endpoint = url::Url::parse(endpoint.trim_end_matches('/'))?;

        let version_url = http_endpoint.join("/json/version")?;
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!(
            browser = %version.browser,
            protocol = %version.protocol_version,
            "Browser discovered"
        );

        let (ws_stream, _) = tokio_tungstenite::connect_async(version.web_socket_debugger_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending).await;
            })
        };

        debug!("CDP client connected to {}", version.web_socket_debugger_url);

        Ok(Self {
            http_endpoint,
            version,
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            request_id: AtomicU64::new(1),
            pending,
            command_timeout,
            recv_task,
        })
    }

    /// WebSocket receive loop.
    async fn receive_loop(mut ws_source: WsSource, pending: PendingMap) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => Self::dispatch(resp, &pending),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Dropping the senders wakes every waiter with `SessionClosed`.
        pending.lock().clear();
    }

    /// Route one inbound frame to its waiter, or log it if it is an event.
    fn dispatch(resp: CdpResponse, pending: &PendingMap) {
        if let Some(id) = resp.id {
            let waiter = pending.lock().remove(&id);
            if let Some(tx) = waiter {
                let result = match resp.error {
                    Some(error) => Err(CdpError::Protocol {
                        code: error.code,
                        message: error.message,
                    }),
                    None => Ok(resp.result.unwrap_or(Value::Null)),
                };
                let _ = tx.send(result);
            }
        } else if let Some(method) = resp.method.as_deref() {
            if method == "Target.detachedFromTarget" {
                let session_id = resp
                    .params
                    .as_ref()
                    .and_then(|p| p["sessionId"].as_str())
                    .unwrap_or_default();
                debug!(session_id, "Browser detached target session");
            } else {
                trace!(method, "Ignoring CDP event");
            }
        }
    }

    /// Send a CDP command and wait for its response.
    ///
    /// `session_id` routes the command to a flattened target session; `None`
    /// addresses the browser itself.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Browser product string, e.g. `Chrome/128.0.0.0`.
    pub fn browser(&self) -> &str {
        &self.version.browser
    }

    /// Protocol version reported by the browser.
    pub fn protocol_version(&self) -> &str {
        &self.version.protocol_version
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// List all targets reported by the HTTP endpoint.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = self.http_endpoint.join("/json/list")?;
        let pages: Vec<PageInfo> = reqwest::get(url).await?.json().await?;
        Ok(pages)
    }

    /// The page the user most recently focused, if any.
    pub async fn active_page(&self) -> Result<Option<PageInfo>, CdpError> {
        let pages = self.list_pages().await?;
        Ok(active_page(&pages).cloned())
    }

    /// Open a flattened debugging session on a target and return its session id.
    pub async fn attach_to_target(&self, target_id: &str) -> Result<String, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        debug!(target_id, session_id = %session_id, "Attached to target");
        Ok(session_id)
    }

    /// Close a debugging session opened by [`attach_to_target`](Self::attach_to_target).
    pub async fn detach_from_target(&self, session_id: &str) -> Result<(), CdpError> {
        self.call(
            "Target.detachFromTarget",
            Some(json!({"sessionId": session_id})),
            None,
        )
        .await?;
        debug!(session_id, "Detached from target");
        Ok(())
    }

    // ========================================================================
    // Page Commands
    // ========================================================================

    /// Insert literal text at the focused element of the session's page.
    pub async fn insert_text(&self, session_id: &str, text: &str) -> Result<(), CdpError> {
        self.call(
            "Input.insertText",
            Some(json!({"text": text})),
            Some(session_id),
        )
        .await?;
        trace!(session_id, chars = text.chars().count(), "Inserted text");
        Ok(())
    }

    /// Evaluate a JavaScript expression in the session's page and return its
    /// value. Promises are awaited.
    pub async fn evaluate(
        &self,
        session_id: &str,
        expression: &str,
        user_gesture: bool,
    ) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                    "userGesture": user_gesture,
                })),
                Some(session_id),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
