//! Whole-page operations: navigate, scroll, screenshot, script execution.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde_json::{json, Value};
use url::Url;

use browser::{BrowserError, SessionManager};

use crate::args;
use crate::error::{OpError, OpResult};
use crate::output::write_output;

/// Settle delay after navigation starts, matching the fixed pauses used
/// elsewhere (scroll, submit).
const NAVIGATE_SETTLE: Duration = Duration::from_secs(1);

/// Accept bare hostnames by defaulting the scheme.
fn normalize_url(raw: &str) -> Result<String, OpError> {
    match Url::parse(raw) {
        Ok(_) => Ok(raw.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let candidate = format!("https://{raw}");
            Url::parse(&candidate)
                .map(|_| candidate)
                .map_err(|e| OpError::InvalidArgument(format!("invalid url {raw}: {e}")))
        }
        Err(e) => Err(OpError::InvalidArgument(format!("invalid url {raw}: {e}"))),
    }
}

pub async fn navigate(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let url = normalize_url(args::str_arg(args, "url")?)?;
    let timeout = args::timeout_arg(args, 30.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    match tokio::time::timeout(timeout, tab.navigate(&url)).await {
        Ok(result) => result.map_err(BrowserError::from)?,
        Err(_) => {
            return Err(OpError::Timeout {
                what: url,
                elapsed_secs: timeout.as_secs_f64(),
            })
        }
    }
    tokio::time::sleep(NAVIGATE_SETTLE).await;

    let info = tab.info().await.map_err(BrowserError::from)?;
    Ok(json!({ "success": true, "url": info.url, "title": info.title }))
}

pub async fn scroll_page(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let direction = args::opt_str(args, "direction").unwrap_or("down");
    let amount = args
        .get("amount")
        .cloned()
        .unwrap_or_else(|| Value::String("page".into()));

    let pixels = match &amount {
        Value::String(s) if s == "page" => 1000,
        Value::String(s) if s == "half" => 500,
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| OpError::InvalidArgument(format!("bad scroll amount: {s}")))?,
        Value::Number(n) => n.as_i64().unwrap_or(1000),
        _ => return Err(OpError::InvalidArgument("bad scroll amount".into())),
    };

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    match direction {
        "bottom" => tab.scroll_to_bottom().await,
        "top" => tab.scroll_to_top().await,
        "down" => tab.scroll_by(0, pixels).await,
        "up" => tab.scroll_by(0, -pixels).await,
        other => {
            return Err(OpError::InvalidArgument(format!(
                "unsupported scroll direction: {other}"
            )))
        }
    }
    .map_err(BrowserError::from)?;

    let wait_after = args::opt_f64(args, "wait_after", 0.5);
    if wait_after > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(wait_after)).await;
    }

    Ok(json!({ "success": true, "direction": direction, "amount": amount }))
}

pub async fn take_screenshot(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let full_page = args::opt_bool(args, "full_page", false);
    let path = match args::opt_str(args, "file_path") {
        Some(p) => p.to_string(),
        None => format!("screenshot_{}.png", Local::now().format("%Y%m%d_%H%M%S")),
    };

    manager.ensure().await?;
    let tab = manager.current_tab().await?;
    let png = tab.screenshot(full_page).await.map_err(BrowserError::from)?;
    let absolute = write_output(&path, &png)?;

    Ok(json!({
        "success": true,
        "file_path": absolute,
        "full_page": full_page,
    }))
}

pub async fn execute_javascript(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let script = args::str_arg(args, "script")?;

    manager.ensure().await?;
    let tab = manager.current_tab().await?;
    let result = tab.evaluate(script).await.map_err(BrowserError::from)?;

    Ok(json!({ "success": true, "result": result }))
}
