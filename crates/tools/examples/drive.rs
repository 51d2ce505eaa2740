//! Drive the operation set end to end against a live Chromium.
//!
//! Requires a Chromium binary on this machine:
//! `cargo run --example drive`

use std::sync::Arc;

use browser::SessionManager;
use serde_json::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let manager = Arc::new(SessionManager::new());

    let init = tools::dispatch(&manager, "init_browser", json!({ "headless": true })).await;
    println!("init_browser -> {init}");

    let nav = tools::dispatch(&manager, "navigate", json!({ "url": "https://example.com" })).await;
    println!("navigate -> {nav}");

    let found = tools::dispatch(&manager, "find_elements", json!({ "selector": "h1" })).await;
    println!("find_elements -> {found}");

    let content =
        tools::dispatch(&manager, "get_page_content", json!({ "format": "markdown" })).await;
    println!("get_page_content -> {content}");

    let status = tools::dispatch(&manager, "get_browser_status", json!({})).await;
    println!("get_browser_status -> {status}");

    let closed = tools::dispatch(&manager, "close_browser", json!({})).await;
    println!("close_browser -> {closed}");
}
