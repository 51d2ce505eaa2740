//! Element location: one tagged selector type, one resolve routine.
//!
//! Every operation that needs a DOM node goes through [`locate`], which
//! polls the page until the selector matches or the caller's timeout
//! elapses. Zero matches at the deadline is a reported outcome, not an
//! error.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cdp::client::CdpError;
use crate::error::Result;
use crate::tab::Tab;

/// Poll interval while waiting for a selector to match.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How many matches are carried back across the transport. The true match
/// count is always reported alongside.
pub const MATCH_CAP: usize = 10;

/// Query language for finding DOM nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    XPath(String),
    /// Literal text match against leaf elements.
    Text(String),
}

impl Selector {
    /// Build from the wire-level `(selector, selector_type)` pair. Unknown
    /// kinds are the caller's invalid-argument case.
    pub fn from_kind(kind: &str, selector: &str) -> Option<Self> {
        match kind {
            "css" => Some(Self::Css(selector.to_string())),
            "xpath" => Some(Self::XPath(selector.to_string())),
            "text" => Some(Self::Text(selector.to_string())),
            _ => None,
        }
    }

    /// JS expression evaluating to an array of matching elements.
    pub fn array_expr(&self) -> String {
        match self {
            Self::Css(selector) => format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(selector)
            ),
            Self::XPath(path) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()",
                js_string(path)
            ),
            Self::Text(needle) => format!(
                "Array.from(document.querySelectorAll('*')).filter(el => \
                 el.childElementCount === 0 && (el.textContent || '').includes({}))",
                js_string(needle)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) | Self::XPath(s) | Self::Text(s) => f.write_str(s),
        }
    }
}

/// JSON-facing projection of a matched node. Never survives a navigation;
/// callers re-locate instead of holding on to these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementInfo {
    pub tag: String,
    pub text: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
}

/// Outcome of a locate call.
#[derive(Debug)]
pub enum Found {
    /// Nothing matched before the deadline.
    None { waited: Duration },
    /// At least one node matched. `elements` is capped at [`MATCH_CAP`];
    /// `count` is the true total.
    Matched {
        count: usize,
        elements: Vec<ElementInfo>,
    },
}

/// Poll the page for the selector until it matches or `timeout` elapses.
/// Always evaluates at least once, so a zero timeout is a single probe.
pub async fn locate(tab: &Tab, selector: &Selector, timeout: Duration) -> Result<Found> {
    let expr = describe_expr(selector);
    let start = Instant::now();
    let deadline = start + timeout;

    loop {
        let value = tab.evaluate(&expr).await?;
        let count = value
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;

        if count > 0 {
            let elements = serde_json::from_value(
                value
                    .get("elements")
                    .cloned()
                    .unwrap_or_else(|| Value::Array(Vec::new())),
            )
            .map_err(CdpError::Json)?;
            return Ok(Found::Matched { count, elements });
        }

        if Instant::now() >= deadline {
            return Ok(Found::None {
                waited: start.elapsed(),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// JS expression for just the match count. Used for scroll-convergence
/// measurements where the element payload would be wasted work.
pub fn count_expr(selector: &Selector) -> String {
    format!("(() => {{ const els = {}; return els.length; }})()", selector.array_expr())
}

fn describe_expr(selector: &Selector) -> String {
    format!(
        "(() => {{ const els = {}; return {{ count: els.length, \
         elements: els.slice(0, {MATCH_CAP}).map(el => ({{ \
         tag: el.tagName ? el.tagName.toLowerCase() : '', \
         text: ((el.innerText || el.textContent || '') + '').trim().slice(0, 200), \
         attrs: Object.fromEntries(Array.from(el.attributes || []).map(a => [a.name, a.value])) \
         }})) }}; }})()",
        selector.array_expr()
    )
}

/// Quote a Rust string as a JS string literal. JSON escaping is valid JS,
/// which keeps user-supplied selectors from breaking out of the script.
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_kind_rejects_unknown() {
        assert!(Selector::from_kind("css", "div").is_some());
        assert!(Selector::from_kind("xpath", "//div").is_some());
        assert!(Selector::from_kind("text", "Sign in").is_some());
        assert!(Selector::from_kind("regex", ".*").is_none());
    }

    #[test]
    fn js_string_escapes_quotes_and_newlines() {
        assert_eq!(js_string("a'b\"c"), r#""a'b\"c""#);
        assert_eq!(js_string("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn css_expr_embeds_escaped_selector() {
        let selector = Selector::Css("div[data-x=\"y\"]".into());
        let expr = selector.array_expr();
        assert!(expr.contains("querySelectorAll"));
        assert!(expr.contains(r#"div[data-x=\"y\"]"#));
    }

    #[test]
    fn describe_expr_caps_at_transport_limit() {
        let expr = describe_expr(&Selector::Css("li".into()));
        assert!(expr.contains("slice(0, 10)"));
        assert!(expr.contains("count: els.length"));
    }

    #[test]
    fn xpath_expr_uses_snapshot_iteration() {
        let expr = Selector::XPath("//a[@href]".into()).array_expr();
        assert!(expr.contains("document.evaluate"));
        assert!(expr.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
    }
}
