//! One attached browser tab.
//!
//! Lightweight handle around the shared [`CdpClient`] with target-specific
//! context. All tabs share the same WebSocket; attaching costs one CDP
//! round-trip plus domain enables.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::cdp::client::{CdpError, Result};
use crate::cdp::protocol::{AttachToTargetResult, Cookie, SessionId, TargetId, TargetInfo};
use crate::cdp::CdpClient;

/// Protocol domains enabled on every attached tab.
const DOMAINS: &[&str] = &["Page", "Runtime", "Network", "DOM"];

/// Handle to one page target.
#[derive(Clone)]
pub struct Tab {
    client: Arc<CdpClient>,
    pub target_id: TargetId,
    session_id: SessionId,
}

impl Tab {
    /// Attach to a target and enable the domains this crate drives.
    pub async fn attach(client: Arc<CdpClient>, target_id: TargetId) -> Result<Self> {
        let result = client
            .send(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
                None,
            )
            .await?;

        let attach: AttachToTargetResult = serde_json::from_value(result)?;
        let session_id = attach.session_id;

        let enables = DOMAINS.iter().map(|domain| {
            let client = client.clone();
            let session_id = session_id.clone();
            async move {
                client
                    .send(format!("{domain}.enable"), None, Some(session_id))
                    .await
            }
        });
        let results = futures_util::future::join_all(enables).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(failed, total = results.len(), "some domain enables failed");
        }

        Ok(Self {
            client,
            target_id,
            session_id,
        })
    }

    /// Send a command in this tab's session context.
    pub async fn send(&self, method: impl Into<String>, params: Option<Value>) -> Result<Value> {
        self.client
            .send(method, params, Some(self.session_id.clone()))
            .await
    }

    /// Current target descriptor (url, title, liveness probe in one).
    pub async fn info(&self) -> Result<TargetInfo> {
        let result = self
            .client
            .send(
                "Target.getTargetInfo",
                Some(json!({ "targetId": &self.target_id })),
                None,
            )
            .await?;

        let info = result
            .get("targetInfo")
            .cloned()
            .ok_or_else(|| CdpError::UnexpectedResponse("missing targetInfo".into()))?;
        Ok(serde_json::from_value(info)?)
    }

    /// Navigate to a URL. Returns once navigation has started; callers add
    /// their own settle delay.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let result = self
            .send("Page.navigate", Some(json!({ "url": url })))
            .await?;
        if let Some(err) = result.get("errorText").and_then(Value::as_str) {
            if !err.is_empty() {
                return Err(CdpError::UnexpectedResponse(format!(
                    "navigation failed: {err}"
                )));
            }
        }
        Ok(())
    }

    /// Evaluate a JS expression and return its JSON value. Uncaught
    /// exceptions come back as `CdpError::JsException`.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .send(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .pointer("/exception/description")
                .and_then(Value::as_str)
                .or_else(|| details.get("text").and_then(Value::as_str))
                .unwrap_or("uncaught exception");
            return Err(CdpError::JsException(text.to_string()));
        }

        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    /// Serialized document, as currently rendered.
    pub async fn html(&self) -> Result<String> {
        let value = self
            .evaluate("document.documentElement ? document.documentElement.outerHTML : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Rendered text of the page body.
    pub async fn inner_text(&self) -> Result<String> {
        let value = self
            .evaluate("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Capture a PNG screenshot of the viewport, or of the whole page.
    pub async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>> {
        let result = self
            .send(
                "Page.captureScreenshot",
                Some(json!({
                    "format": "png",
                    "captureBeyondViewport": full_page,
                })),
            )
            .await?;

        let data = result
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| CdpError::UnexpectedResponse("screenshot returned no data".into()))?;
        BASE64
            .decode(data)
            .map_err(|e| CdpError::UnexpectedResponse(format!("bad screenshot payload: {e}")))
    }

    /// All cookies visible to this tab.
    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        let result = self.send("Network.getCookies", None).await?;
        let cookies = result
            .get("cookies")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(serde_json::from_value(cookies)?)
    }

    pub async fn set_cookie(&self, name: &str, value: &str, domain: &str) -> Result<()> {
        self.send(
            "Network.setCookie",
            Some(json!({ "name": name, "value": value, "domain": domain, "path": "/" })),
        )
        .await?;
        Ok(())
    }

    /// Delete every cookie with this name on the tab's current URL.
    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        let info = self.info().await?;
        self.send(
            "Network.deleteCookies",
            Some(json!({ "name": name, "url": info.url })),
        )
        .await?;
        Ok(())
    }

    pub async fn clear_cookies(&self) -> Result<()> {
        self.send("Network.clearBrowserCookies", None).await?;
        Ok(())
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.evaluate("window.scrollTo(0, document.body ? document.body.scrollHeight : 0)")
            .await?;
        Ok(())
    }

    pub async fn scroll_to_top(&self) -> Result<()> {
        self.evaluate("window.scrollTo(0, 0)").await?;
        Ok(())
    }

    pub async fn scroll_by(&self, x: i64, y: i64) -> Result<()> {
        self.evaluate(&format!("window.scrollBy({x}, {y})")).await?;
        Ok(())
    }

    /// Current page height, the selector-less scroll measurement.
    pub async fn scroll_height(&self) -> Result<u64> {
        let value = self
            .evaluate("document.body ? document.body.scrollHeight : 0")
            .await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    /// Bring this tab to the front.
    pub async fn activate(&self) -> Result<()> {
        self.client
            .send(
                "Target.activateTarget",
                Some(json!({ "targetId": &self.target_id })),
                None,
            )
            .await?;
        Ok(())
    }
}
