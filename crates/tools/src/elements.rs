//! Element operations: find, click, type, read text/attributes, wait.
//!
//! All of these resolve through the locator at action time; element handles
//! are never held across calls, so navigations cannot leave stale state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use browser::locator::{self, js_string};
use browser::{BrowserError, Found, Selector, SessionManager, Tab};

use crate::args;
use crate::error::{OpError, OpResult};

pub async fn find_elements(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::selector_arg(args)?;
    let single = args::opt_bool(args, "single", false);
    let timeout = args::timeout_arg(args, 10.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    match locator::locate(&tab, &selector, timeout).await? {
        Found::None { .. } => Ok(json!({ "success": true, "found": false, "count": 0 })),
        Found::Matched { count, elements } => {
            if single {
                Ok(json!({
                    "success": true,
                    "found": true,
                    "count": 1,
                    "element": elements.first(),
                }))
            } else {
                Ok(json!({
                    "success": true,
                    "found": true,
                    "count": count,
                    "elements": elements,
                }))
            }
        }
    }
}

pub async fn click_element(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::selector_arg(args)?;
    let timeout = args::timeout_arg(args, 10.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    if let Found::None { .. } = locator::locate(&tab, &selector, timeout).await? {
        return Err(OpError::NotFound {
            what: "element",
            target: selector.to_string(),
        });
    }

    let result = tab
        .evaluate(&click_expr(&selector))
        .await
        .map_err(BrowserError::from)?;
    if result.is_null() {
        // Matched during the wait but gone by click time.
        return Err(OpError::NotFound {
            what: "element",
            target: selector.to_string(),
        });
    }

    let wait_after = args::opt_f64(args, "wait_after", 1.0);
    if wait_after > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(wait_after)).await;
    }

    Ok(json!({
        "success": true,
        "element": { "tag": result.get("tag"), "text": result.get("text") },
    }))
}

pub async fn input_text(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::selector_arg(args)?;
    let text = args::str_arg(args, "text")?;
    let clear_first = args::opt_bool(args, "clear_first", true);
    let timeout = args::timeout_arg(args, 10.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    if let Found::None { .. } = locator::locate(&tab, &selector, timeout).await? {
        return Err(OpError::NotFound {
            what: "element",
            target: selector.to_string(),
        });
    }

    let result = tab
        .evaluate(&input_expr(&selector, text, clear_first))
        .await
        .map_err(BrowserError::from)?;
    if result.is_null() {
        return Err(OpError::NotFound {
            what: "element",
            target: selector.to_string(),
        });
    }

    Ok(json!({ "success": true, "text": text }))
}

pub async fn get_element_text(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::selector_arg(args)?;
    let timeout = args::timeout_arg(args, 10.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    match locator::locate(&tab, &selector, timeout).await? {
        Found::None { .. } => Err(OpError::NotFound {
            what: "element",
            target: selector.to_string(),
        }),
        Found::Matched { elements, .. } => {
            let element = elements.first().ok_or(OpError::NotFound {
                what: "element",
                target: selector.to_string(),
            })?;
            Ok(json!({ "success": true, "text": element.text, "tag": element.tag }))
        }
    }
}

pub async fn get_element_attribute(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::selector_arg(args)?;
    let attribute = args::str_arg(args, "attribute")?;
    let timeout = args::timeout_arg(args, 10.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    match locator::locate(&tab, &selector, timeout).await? {
        Found::None { .. } => Err(OpError::NotFound {
            what: "element",
            target: selector.to_string(),
        }),
        Found::Matched { elements, .. } => {
            let value = elements
                .first()
                .and_then(|element| element.attrs.get(attribute));
            Ok(json!({ "success": true, "attribute": attribute, "value": value }))
        }
    }
}

pub async fn wait_for_element(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::selector_arg(args)?;
    let timeout = args::timeout_arg(args, 30.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    let start = Instant::now();
    match locator::locate(&tab, &selector, timeout).await? {
        Found::Matched { elements, .. } => Ok(json!({
            "success": true,
            "elapsed": start.elapsed().as_secs_f64(),
            "element": elements.first(),
        })),
        Found::None { waited } => Err(OpError::Timeout {
            what: selector.to_string(),
            elapsed_secs: waited.as_secs_f64(),
        }),
    }
}

fn click_expr(selector: &Selector) -> String {
    format!(
        "(() => {{ const els = {}; if (!els.length) return null; const el = els[0]; \
         el.scrollIntoView({{block: 'center'}}); el.click(); \
         return {{ tag: el.tagName.toLowerCase(), \
         text: (el.innerText || '').trim().slice(0, 200) }}; }})()",
        selector.array_expr()
    )
}

fn input_expr(selector: &Selector, text: &str, clear_first: bool) -> String {
    let clear = if clear_first { "el.value = '';" } else { "" };
    format!(
        "(() => {{ const els = {}; if (!els.length) return null; const el = els[0]; \
         el.focus(); {clear} el.value = (el.value || '') + {}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return {{ tag: el.tagName.toLowerCase() }}; }})()",
        selector.array_expr(),
        js_string(text),
    )
}

/// Click the first match of a bare CSS selector, without the locator wait.
/// Shared with form submission.
pub(crate) async fn click_once(tab: &Tab, selector: &str) -> Result<bool, OpError> {
    let expr = format!(
        "(() => {{ const el = document.querySelector({}); if (!el) return false; \
         el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()",
        js_string(selector)
    );
    let result = tab.evaluate(&expr).await.map_err(BrowserError::from)?;
    Ok(result.as_bool().unwrap_or(false))
}
