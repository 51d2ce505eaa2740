//! CDP wire types.
//!
//! Only the protocol surface this crate actually drives: command envelopes,
//! events, target descriptors, and cookies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request id - monotonically increasing per connection.
pub type RequestId = u64;

/// Target id assigned by the browser.
pub type TargetId = String;

/// Session id for attached targets.
pub type SessionId = String;

/// Command sent to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// Command response from the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    pub id: RequestId,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<CdpErrorPayload>,
}

/// Error payload inside a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpErrorPayload {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Unsolicited event from the browser (no request id).
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEvent {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

/// Anything the browser can send us.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CdpMessage {
    Response(CdpResponse),
    Event(CdpEvent),
}

/// Target descriptor from `Target.getTargets` / `Target.getTargetInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetInfo {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
    #[serde(rename = "type")]
    pub target_type: String,
    pub title: String,
    pub url: String,
    pub attached: bool,
}

/// Result of `Target.attachToTarget`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachToTargetResult {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}

/// Cookie as reported by `Network.getCookies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(rename = "httpOnly", default)]
    pub http_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_and_event_disambiguate() {
        let response: CdpMessage =
            serde_json::from_str(r#"{"id":7,"result":{"ok":true}}"#).unwrap();
        assert!(matches!(response, CdpMessage::Response(r) if r.id == 7));

        let event: CdpMessage =
            serde_json::from_str(r#"{"method":"Page.loadEventFired","params":{}}"#).unwrap();
        assert!(matches!(event, CdpMessage::Event(e) if e.method == "Page.loadEventFired"));
    }

    #[test]
    fn request_skips_absent_fields() {
        let request = CdpRequest {
            id: 1,
            method: "Browser.getVersion".into(),
            params: None,
            session_id: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("params"));
        assert!(!json.contains("sessionId"));
    }
}
