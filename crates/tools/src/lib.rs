//! Exposed browser operations: named entry points over JSON argument maps.
//!
//! A transport layer (RPC server, stdio bridge) resolves an operation name,
//! hands the argument map to [`dispatch`], and serializes the returned map.
//! Every result carries `success: bool`; failures come back as
//! `{success: false, error}` and nothing here ever panics across that
//! boundary.

pub mod args;
pub mod browser_ops;
pub mod content;
pub mod cookies;
pub mod data;
pub mod elements;
pub mod error;
pub mod form;
mod output;
pub mod page;
pub mod scroll;
pub mod tabs;

pub use error::{OpError, OpResult};
pub use scroll::{Convergence, ScrollState};

use std::sync::Arc;

use serde_json::{json, Value};

use browser::SessionManager;

/// Operation names understood by [`dispatch`].
pub const OPERATIONS: &[&str] = &[
    "init_browser",
    "get_browser_status",
    "close_browser",
    "navigate",
    "find_elements",
    "click_element",
    "input_text",
    "get_element_text",
    "get_element_attribute",
    "wait_for_element",
    "scroll_page",
    "take_screenshot",
    "execute_javascript",
    "page_to_markdown",
    "get_page_content",
    "extract_table_data",
    "smart_extract",
    "fill_form",
    "handle_infinite_scroll",
    "manage_cookies",
    "switch_to_tab",
];

/// Run one named operation against the given session.
pub async fn dispatch(manager: &Arc<SessionManager>, name: &str, args: Value) -> Value {
    let result = match name {
        "init_browser" => browser_ops::init_browser(manager, &args).await,
        "get_browser_status" => browser_ops::get_browser_status(manager, &args).await,
        "close_browser" => browser_ops::close_browser(manager, &args).await,
        "navigate" => page::navigate(manager, &args).await,
        "find_elements" => elements::find_elements(manager, &args).await,
        "click_element" => elements::click_element(manager, &args).await,
        "input_text" => elements::input_text(manager, &args).await,
        "get_element_text" => elements::get_element_text(manager, &args).await,
        "get_element_attribute" => elements::get_element_attribute(manager, &args).await,
        "wait_for_element" => elements::wait_for_element(manager, &args).await,
        "scroll_page" => page::scroll_page(manager, &args).await,
        "take_screenshot" => page::take_screenshot(manager, &args).await,
        "execute_javascript" => page::execute_javascript(manager, &args).await,
        "page_to_markdown" => content::page_to_markdown(manager, &args).await,
        "get_page_content" => content::get_page_content(manager, &args).await,
        "extract_table_data" => data::extract_table_data(manager, &args).await,
        "smart_extract" => data::smart_extract(manager, &args).await,
        "fill_form" => form::fill_form(manager, &args).await,
        "handle_infinite_scroll" => scroll::handle_infinite_scroll(manager, &args).await,
        "manage_cookies" => cookies::manage_cookies(manager, &args).await,
        "switch_to_tab" => tabs::switch_to_tab(manager, &args).await,
        _ => Err(OpError::InvalidArgument(format!("unknown operation: {name}"))),
    };

    match result {
        Ok(value) => value,
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_operation_is_a_structured_failure() {
        let manager = Arc::new(SessionManager::new());
        let result = dispatch(&manager, "teleport", json!({})).await;
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("teleport"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_a_structured_failure() {
        let manager = Arc::new(SessionManager::new());
        let result = dispatch(&manager, "navigate", json!({})).await;
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("url"));
    }

    #[tokio::test]
    async fn status_without_session_reports_not_running() {
        let manager = Arc::new(SessionManager::new());
        let result = dispatch(&manager, "get_browser_status", json!({})).await;
        assert_eq!(result["success"], true);
        assert_eq!(result["running"], false);
    }

    #[tokio::test]
    async fn close_without_session_succeeds() {
        let manager = Arc::new(SessionManager::new());
        let result = dispatch(&manager, "close_browser", json!({})).await;
        assert_eq!(result["success"], true);
    }

    #[tokio::test]
    async fn argument_validation_fails_before_any_launch() {
        // Each of these rejects its arguments before touching the session,
        // so no browser is ever spawned and the failure is structured.
        let manager = Arc::new(SessionManager::new());
        let cases = [
            ("navigate", json!({})),
            ("find_elements", json!({})),
            ("click_element", json!({ "selector": "a", "selector_type": "glob" })),
            ("input_text", json!({ "selector": "#q" })),
            ("get_element_text", json!({})),
            ("get_element_attribute", json!({ "selector": "#q" })),
            ("wait_for_element", json!({})),
            ("scroll_page", json!({ "amount": "sideways" })),
            ("execute_javascript", json!({})),
            ("page_to_markdown", json!({})),
            ("get_page_content", json!({ "format": "pdf" })),
            ("smart_extract", json!({ "selector": ".x" })),
            ("fill_form", json!({})),
            ("manage_cookies", json!({})),
            ("switch_to_tab", json!({})),
        ];
        for (name, args) in cases {
            let result = dispatch(&manager, name, args).await;
            assert_eq!(result["success"], false, "operation {name}");
            assert!(result["error"].as_str().is_some(), "operation {name}");
        }
        assert!(!manager.is_running().await);
    }

    #[test]
    fn operation_table_has_no_duplicates() {
        let mut names: Vec<&str> = OPERATIONS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OPERATIONS.len());
    }

    #[tokio::test]
    #[ignore] // needs a Chromium binary and network access
    async fn navigate_and_extract_end_to_end() {
        let manager = Arc::new(SessionManager::new());

        let init = dispatch(&manager, "init_browser", json!({ "headless": true })).await;
        assert_eq!(init["success"], true);

        let nav = dispatch(&manager, "navigate", json!({ "url": "https://example.com" })).await;
        assert_eq!(nav["success"], true);
        assert!(nav["url"].as_str().unwrap().contains("example.com"));

        let found = dispatch(&manager, "find_elements", json!({ "selector": "h1" })).await;
        assert_eq!(found["found"], true);

        let content =
            dispatch(&manager, "get_page_content", json!({ "format": "markdown" })).await;
        assert_eq!(content["success"], true);
        assert!(content["length"].as_u64().unwrap() > 0);

        let closed = dispatch(&manager, "close_browser", json!({})).await;
        assert_eq!(closed["success"], true);

        let status = dispatch(&manager, "get_browser_status", json!({})).await;
        assert_eq!(status["running"], false);
    }
}
