//! Tab management: create, switch, close, list.

use std::sync::Arc;

use serde_json::{json, Value};

use browser::{BrowserError, SessionManager};

use crate::args;
use crate::error::{OpError, OpResult};

pub async fn switch_to_tab(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let action = args::str_arg(args, "action")?;
    manager.ensure().await?;

    match action {
        "new" => {
            let tab = manager.new_tab(args::opt_str(args, "url")).await?;
            let info = tab.info().await.map_err(BrowserError::from)?;
            Ok(json!({
                "success": true,
                "action": "new",
                "url": info.url,
                "title": info.title,
            }))
        }
        "switch" => {
            let tabs = manager.list_tabs().await?;
            let target = if let Some(index) = args.get("index").and_then(Value::as_u64) {
                tabs.get(index as usize).cloned().ok_or_else(|| {
                    OpError::InvalidArgument(format!("tab index {index} out of range"))
                })?
            } else if let Some(url) = args::opt_str(args, "url") {
                tabs.iter()
                    .find(|t| t.url.contains(url))
                    .cloned()
                    .ok_or_else(|| OpError::NotFound {
                        what: "tab",
                        target: url.to_string(),
                    })?
            } else if let Some(pattern) = args::opt_str(args, "title_pattern") {
                tabs.iter()
                    .find(|t| t.title.contains(pattern))
                    .cloned()
                    .ok_or_else(|| OpError::NotFound {
                        what: "tab",
                        target: pattern.to_string(),
                    })?
            } else {
                return Err(OpError::InvalidArgument(
                    "switch requires index, url, or title_pattern".into(),
                ));
            };

            let tab = manager.switch_to(&target.target_id).await?;
            let info = tab.info().await.map_err(BrowserError::from)?;
            Ok(json!({
                "success": true,
                "action": "switch",
                "url": info.url,
                "title": info.title,
            }))
        }
        "close" => {
            let target_id = match args.get("index").and_then(Value::as_u64) {
                Some(index) => {
                    let tabs = manager.list_tabs().await?;
                    tabs.get(index as usize)
                        .map(|t| t.target_id.clone())
                        .ok_or_else(|| {
                            OpError::InvalidArgument(format!("tab index {index} out of range"))
                        })?
                }
                None => manager.current_tab().await?.target_id.clone(),
            };
            manager.close_tab(&target_id).await?;
            Ok(json!({ "success": true, "action": "close" }))
        }
        "list" => {
            let tabs = manager.list_tabs().await?;
            let current = manager.current_target_id().await;
            let listing: Vec<Value> = tabs
                .iter()
                .enumerate()
                .map(|(index, t)| {
                    json!({
                        "index": index,
                        "url": t.url,
                        "title": t.title,
                        "is_current": Some(&t.target_id) == current.as_ref(),
                    })
                })
                .collect();
            Ok(json!({
                "success": true,
                "action": "list",
                "count": listing.len(),
                "tabs": listing,
            }))
        }
        other => Err(OpError::InvalidArgument(format!(
            "unsupported tab action: {other}"
        ))),
    }
}
