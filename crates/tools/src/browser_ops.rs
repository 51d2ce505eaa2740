//! Session lifecycle operations: init, status, close.

use std::sync::Arc;

use serde_json::{json, Value};

use browser::{InitOutcome, LaunchOptions, SessionManager, Status, TabCount};

use crate::error::{OpError, OpResult};

/// Render a status into its wire shape. Approximate tab counts keep their
/// cause so callers can tell "really one tab" from "probe failed".
pub(crate) fn status_map(status: &Status) -> Value {
    if !status.running {
        return json!({ "running": false });
    }

    let mut map = json!({
        "running": true,
        "url": status.url,
        "title": status.title,
    });
    if let Some(tab_count) = &status.tab_count {
        map["tab_count"] = json!(tab_count.count());
        if let TabCount::Approximate { cause, .. } = tab_count {
            map["tab_count_approximate"] = json!(true);
            map["tab_count_cause"] = json!(cause);
        }
    }
    map
}

pub async fn init_browser(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let options = if args.is_null() {
        LaunchOptions::default()
    } else {
        serde_json::from_value(args.clone())
            .map_err(|e| OpError::InvalidArgument(format!("bad launch options: {e}")))?
    };

    let (message, status) = match manager.init(options).await? {
        InitOutcome::Launched(status) => ("browser started", status),
        InitOutcome::AlreadyRunning(status) => ("browser already running", status),
    };

    Ok(json!({
        "success": true,
        "message": message,
        "status": status_map(&status),
    }))
}

pub async fn get_browser_status(manager: &Arc<SessionManager>, _args: &Value) -> OpResult {
    let status = manager.status().await;
    let mut map = status_map(&status);
    map["success"] = json!(true);
    Ok(map)
}

pub async fn close_browser(manager: &Arc<SessionManager>, _args: &Value) -> OpResult {
    manager.close().await?;
    Ok(json!({ "success": true, "message": "browser closed" }))
}
