//! Content pipeline operations: page to markdown file, page content inline.

use std::sync::Arc;

use serde_json::{json, Value};

use browser::{BrowserError, SessionManager, Tab};
use extract::{convert, ExtractionConfig, OutputFormat};

use crate::args;
use crate::error::{OpError, OpResult};
use crate::output::write_output;

/// Current tab plus its serialized document and identity.
async fn page_context(manager: &Arc<SessionManager>) -> Result<(Tab, String, String, String), OpError> {
    manager.ensure().await?;
    let tab = manager.current_tab().await?;
    let info = tab.info().await.map_err(BrowserError::from)?;
    let html = tab.html().await.map_err(BrowserError::from)?;
    Ok((tab, html, info.url, info.title))
}

pub async fn page_to_markdown(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let file_path = args::str_arg(args, "file_path")?;
    let config = ExtractionConfig {
        include_images: args::opt_bool(args, "include_images", true),
        remove_ads: args::opt_bool(args, "remove_ads", true),
        extract_main: args::opt_bool(args, "extract_main", true),
        add_metadata: args::opt_bool(args, "add_metadata", true),
        format: OutputFormat::Markdown,
    };

    let (_tab, html, url, title) = page_context(manager).await?;
    if html.is_empty() {
        return Err(OpError::NotFound {
            what: "page content",
            target: url,
        });
    }

    let markdown = extract::convert_page(&html, &title, &url, &config)?;
    let absolute = write_output(file_path, markdown.as_bytes())?;

    Ok(json!({
        "success": true,
        "file_path": absolute,
        "url": url,
        "title": title,
        "stats": convert::stats(&markdown),
    }))
}

pub async fn get_page_content(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let format_str = args::opt_str(args, "format").unwrap_or("markdown");
    let format = OutputFormat::parse(format_str)
        .ok_or_else(|| OpError::InvalidArgument(format!("unsupported format: {format_str}")))?;

    let config = ExtractionConfig {
        include_images: true,
        remove_ads: args::opt_bool(args, "remove_ads", true),
        extract_main: args::opt_bool(args, "extract_main", true),
        add_metadata: false,
        format,
    };

    let (tab, html, url, title) = page_context(manager).await?;
    let content = match format {
        // Plain text comes from the renderer, which already applies layout.
        OutputFormat::Text => tab.inner_text().await.map_err(BrowserError::from)?,
        _ => extract::convert_page(&html, &title, &url, &config)?,
    };

    Ok(json!({
        "success": true,
        "url": url,
        "title": title,
        "format": format_str,
        "content": content,
        "length": content.chars().count(),
    }))
}
