//! Chromium discovery and launch.
//!
//! Spawns the browser with a remote-debugging port and resolves the DevTools
//! WebSocket endpoint from `/json/version`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, warn};
use url::Url;

use crate::error::BrowserError;
use crate::session::LaunchOptions;

const ENDPOINT_RETRIES: u32 = 50;
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Find a Chromium-family binary.
pub fn find_chrome() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    let paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    ];

    #[cfg(target_os = "linux")]
    let paths = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    #[cfg(target_os = "windows")]
    let paths = [
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ];

    paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// True if a DevTools endpoint is already answering on this port.
pub async fn endpoint_alive(port: u16) -> bool {
    reqwest::get(format!("http://127.0.0.1:{port}/json/version"))
        .await
        .is_ok()
}

/// Spawn Chromium with remote debugging enabled.
pub fn spawn(options: &LaunchOptions) -> std::result::Result<Child, BrowserError> {
    let chrome = find_chrome().ok_or(BrowserError::ChromeNotFound)?;

    let profile_dir = std::env::temp_dir().join(format!("browser-profile-{}", options.debug_port));
    if let Err(e) = std::fs::create_dir_all(&profile_dir) {
        warn!(error = %e, "failed to create profile directory");
    }

    let mut cmd = Command::new(&chrome);
    cmd.arg(format!("--remote-debugging-port={}", options.debug_port))
        .arg(format!("--user-data-dir={}", profile_dir.display()))
        .arg(format!(
            "--window-size={},{}",
            options.window_size.0, options.window_size.1
        ))
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    if options.headless {
        cmd.arg("--headless=new");
    }
    if let Some(user_agent) = &options.user_agent {
        cmd.arg(format!("--user-agent={user_agent}"));
    }
    if let Some(proxy) = &options.proxy {
        cmd.arg(format!("--proxy-server={proxy}"));
    }

    let child = cmd
        .spawn()
        .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
    info!(pid = ?child.id(), path = %chrome.display(), "chromium launched");
    Ok(child)
}

/// Wait for the DevTools endpoint and return its browser WebSocket URL.
pub async fn websocket_url(port: u16) -> std::result::Result<String, BrowserError> {
    let endpoint = format!("http://127.0.0.1:{port}/json/version");

    for _ in 0..ENDPOINT_RETRIES {
        if let Some(ws_url) = probe(&endpoint).await {
            if Url::parse(&ws_url).map(|u| u.scheme() == "ws").unwrap_or(false) {
                return Ok(ws_url);
            }
            return Err(BrowserError::LaunchFailed(format!(
                "unexpected debugger url: {ws_url}"
            )));
        }
        tokio::time::sleep(RETRY_DELAY).await;
    }

    Err(BrowserError::LaunchFailed(format!(
        "devtools endpoint on port {port} did not come up"
    )))
}

async fn probe(endpoint: &str) -> Option<String> {
    let response = reqwest::get(endpoint).await.ok()?;
    let body: serde_json::Value = response.json().await.ok()?;
    body.get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dead_port_is_not_alive() {
        // Port 1 is never a devtools endpoint.
        assert!(!endpoint_alive(1).await);
    }
}
