//! Cookie management: get, set, delete, clear.

use std::sync::Arc;

use serde_json::{json, Value};
use url::Url;

use browser::{BrowserError, SessionManager};

use crate::args;
use crate::error::{OpError, OpResult};

pub async fn manage_cookies(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let action = args::str_arg(args, "action")?;

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    match action {
        "get" => {
            let cookies = tab.cookies().await.map_err(BrowserError::from)?;
            match args::opt_str(args, "name") {
                Some(name) => {
                    let value = cookies.iter().find(|c| c.name == name).map(|c| c.value.clone());
                    Ok(json!({ "success": true, "action": "get", "name": name, "value": value }))
                }
                None => Ok(json!({
                    "success": true,
                    "action": "get",
                    "count": cookies.len(),
                    "cookies": cookies,
                })),
            }
        }
        "set" => {
            let name = args::str_arg(args, "name")?;
            let value = args::str_arg(args, "value")?;
            // Default the domain to the current page's host.
            let domain = match args::opt_str(args, "domain") {
                Some(domain) => domain.to_string(),
                None => {
                    let info = tab.info().await.map_err(BrowserError::from)?;
                    Url::parse(&info.url)
                        .ok()
                        .and_then(|u| u.host_str().map(str::to_string))
                        .ok_or_else(|| {
                            OpError::InvalidArgument(
                                "domain required when the current page has no host".into(),
                            )
                        })?
                }
            };
            tab.set_cookie(name, value, &domain)
                .await
                .map_err(BrowserError::from)?;
            Ok(json!({ "success": true, "action": "set", "name": name, "domain": domain }))
        }
        "delete" => {
            let name = args::str_arg(args, "name")?;
            tab.delete_cookie(name).await.map_err(BrowserError::from)?;
            Ok(json!({ "success": true, "action": "delete", "name": name }))
        }
        "clear" => {
            tab.clear_cookies().await.map_err(BrowserError::from)?;
            Ok(json!({ "success": true, "action": "clear" }))
        }
        other => Err(OpError::InvalidArgument(format!(
            "unsupported cookie action: {other}"
        ))),
    }
}
