//! Session management: one browser process, one current tab, one lock.
//!
//! The manager is an explicitly constructed instance, shared via `Arc` and
//! injected into every operation. All mutation of the session state (init,
//! close, tab reassignment) happens under the write half of one `RwLock`;
//! readers tolerate a concurrent close by reporting a vanished browser as
//! "not running".

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::process::Child;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cdp::client::CdpError;
use crate::cdp::protocol::{TargetId, TargetInfo};
use crate::cdp::CdpClient;
use crate::error::{BrowserError, Result};
use crate::launcher;
use crate::tab::Tab;

/// Browser launch configuration. Binds directly from the `init_browser`
/// argument map; absent keys take these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchOptions {
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,
}

fn default_window_size() -> (u32, u32) {
    (1920, 1080)
}

fn default_debug_port() -> u16 {
    9222
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: default_window_size(),
            user_agent: None,
            proxy: None,
            debug_port: default_debug_port(),
        }
    }
}

/// Open-tab count, with the probe failure kept when enumeration broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCount {
    Accurate(usize),
    /// Enumeration failed; `count` is the best-effort fallback.
    Approximate { count: usize, cause: String },
}

impl TabCount {
    pub fn count(&self) -> usize {
        match self {
            Self::Accurate(count) => *count,
            Self::Approximate { count, .. } => *count,
        }
    }
}

/// Point-in-time session status. Never an error: probe failures degrade to
/// approximate fields instead of propagating.
#[derive(Debug, Clone)]
pub struct Status {
    pub running: bool,
    pub url: Option<String>,
    pub title: Option<String>,
    pub tab_count: Option<TabCount>,
}

impl Status {
    pub fn not_running() -> Self {
        Self {
            running: false,
            url: None,
            title: None,
            tab_count: None,
        }
    }
}

/// What an `init` call observed.
#[derive(Debug)]
pub enum InitOutcome {
    /// This call performed the launch.
    Launched(Status),
    /// A session already existed; its status is returned unchanged.
    AlreadyRunning(Status),
}

struct Session {
    id: String,
    client: Arc<CdpClient>,
    /// Present only when this manager spawned the process itself.
    process: Option<Child>,
    current_tab: Option<Tab>,
}

/// Owner of the single browser instance and the "current tab" pointer.
pub struct SessionManager {
    state: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(None),
        }
    }

    /// Launch the browser, or report the session that already exists.
    ///
    /// The write lock is held across the launch, so concurrent callers
    /// resolve to exactly one spawned process; every other caller observes
    /// `AlreadyRunning` with the same resulting status.
    pub async fn init(&self, options: LaunchOptions) -> Result<InitOutcome> {
        let mut guard = self.state.write().await;
        if let Some(session) = guard.as_ref() {
            debug!(session = %session.id, "init requested while a session is live");
            return Ok(InitOutcome::AlreadyRunning(probe_status(session).await));
        }

        let mut process = if launcher::endpoint_alive(options.debug_port).await {
            info!(port = options.debug_port, "devtools endpoint already live, attaching");
            None
        } else {
            Some(launcher::spawn(&options)?)
        };

        let connected = async {
            let ws_url = launcher::websocket_url(options.debug_port).await?;
            let client = CdpClient::connect(&ws_url).await?;
            let tab = match most_recent_tab(&client).await? {
                Some(tab) => tab,
                None => create_tab(&client, "about:blank").await?,
            };
            Ok::<_, BrowserError>((client, tab))
        }
        .await;

        let (client, tab) = match connected {
            Ok(pair) => pair,
            Err(e) => {
                if let Some(mut child) = process.take() {
                    let _ = child.kill().await;
                }
                return Err(e);
            }
        };

        let session = Session {
            id: Uuid::now_v7().to_string(),
            client,
            process,
            current_tab: Some(tab),
        };
        info!(session = %session.id, "browser session started");
        let status = probe_status(&session).await;
        *guard = Some(session);
        Ok(InitOutcome::Launched(status))
    }

    /// Best-effort status. Never fails; a vanished browser reads as
    /// `running: false`.
    pub async fn status(&self) -> Status {
        let guard = self.state.read().await;
        match guard.as_ref() {
            Some(session) => probe_status(session).await,
            None => Status::not_running(),
        }
    }

    /// Tear down the browser. Session state is cleared before teardown, so a
    /// failing close can never leave a half-alive session behind.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.state.write().await;
        let Some(mut session) = guard.take() else {
            return Ok(());
        };

        let teardown = session.client.send("Browser.close", None, None).await;
        let _ = session.client.close().await;
        if let Some(mut child) = session.process.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill browser process");
            }
        }
        info!(session = %session.id, "browser session closed");

        teardown.map(|_| ()).map_err(BrowserError::Cdp)
    }

    /// Make sure a session exists, launching with defaults if needed. Only
    /// the first of any concurrent callers performs the launch.
    pub async fn ensure(&self) -> Result<()> {
        if self.state.read().await.is_some() {
            return Ok(());
        }
        self.init(LaunchOptions::default()).await.map(|_| ())
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// The tracked tab, re-resolved to the most recently opened page when
    /// the tracked handle is gone or its target no longer exists.
    pub async fn current_tab(&self) -> Result<Tab> {
        {
            let guard = self.state.read().await;
            let session = guard.as_ref().ok_or(BrowserError::NotRunning)?;
            if let Some(tab) = &session.current_tab {
                if tab.info().await.is_ok() {
                    return Ok(tab.clone());
                }
            }
        }

        let mut guard = self.state.write().await;
        let session = guard.as_mut().ok_or(BrowserError::NotRunning)?;
        let tab = most_recent_tab(&session.client)
            .await?
            .ok_or(BrowserError::NoTab)?;
        debug!(target = %tab.target_id, "current tab re-resolved");
        session.current_tab = Some(tab.clone());
        Ok(tab)
    }

    pub async fn current_target_id(&self) -> Option<TargetId> {
        self.state
            .read()
            .await
            .as_ref()?
            .current_tab
            .as_ref()
            .map(|t| t.target_id.clone())
    }

    pub async fn set_current_tab(&self, tab: Tab) -> Result<()> {
        let mut guard = self.state.write().await;
        let session = guard.as_mut().ok_or(BrowserError::NotRunning)?;
        session.current_tab = Some(tab);
        Ok(())
    }

    /// Open a tab and make it current.
    pub async fn new_tab(&self, url: Option<&str>) -> Result<Tab> {
        let mut guard = self.state.write().await;
        let session = guard.as_mut().ok_or(BrowserError::NotRunning)?;
        let tab = create_tab(&session.client, url.unwrap_or("about:blank")).await?;
        session.current_tab = Some(tab.clone());
        Ok(tab)
    }

    /// Open page targets, newest first.
    pub async fn list_tabs(&self) -> Result<Vec<TargetInfo>> {
        let guard = self.state.read().await;
        let session = guard.as_ref().ok_or(BrowserError::NotRunning)?;
        Ok(page_targets(&session.client).await?)
    }

    /// Attach to a known target, bring it to the front, and make it current.
    pub async fn switch_to(&self, target_id: &str) -> Result<Tab> {
        let mut guard = self.state.write().await;
        let session = guard.as_mut().ok_or(BrowserError::NotRunning)?;
        let tab = Tab::attach(session.client.clone(), target_id.to_string()).await?;
        tab.activate().await?;
        session.current_tab = Some(tab.clone());
        Ok(tab)
    }

    /// Close a tab. Closing the current tab falls back to the most recently
    /// opened remaining one.
    pub async fn close_tab(&self, target_id: &str) -> Result<()> {
        let mut guard = self.state.write().await;
        let session = guard.as_mut().ok_or(BrowserError::NotRunning)?;
        session
            .client
            .send(
                "Target.closeTarget",
                Some(json!({ "targetId": target_id })),
                None,
            )
            .await
            .map_err(BrowserError::Cdp)?;

        let closed_current =
            session.current_tab.as_ref().map(|t| t.target_id.as_str()) == Some(target_id);
        if closed_current {
            session.current_tab = most_recent_tab(&session.client).await?;
        }
        Ok(())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Status probe over a live session. Degrades per field: tab enumeration
/// failure keeps its cause in `TabCount::Approximate`, a torn-down
/// connection reads as "not running".
async fn probe_status(session: &Session) -> Status {
    let targets = match page_targets(&session.client).await {
        Ok(targets) => Ok(targets),
        Err(CdpError::Closed) => return Status::not_running(),
        Err(e) => Err(e),
    };

    let tab_count = match &targets {
        Ok(targets) => TabCount::Accurate(targets.len()),
        Err(e) => TabCount::Approximate {
            count: 1,
            cause: e.to_string(),
        },
    };

    let (url, title) = match &session.current_tab {
        Some(tab) => match tab.info().await {
            Ok(info) => (Some(info.url), Some(info.title)),
            Err(_) => fallback_identity(targets.as_ref().ok()),
        },
        None => fallback_identity(targets.as_ref().ok()),
    };

    Status {
        running: true,
        url,
        title,
        tab_count: Some(tab_count),
    }
}

fn fallback_identity(targets: Option<&Vec<TargetInfo>>) -> (Option<String>, Option<String>) {
    match targets.and_then(|t| t.first()) {
        Some(info) => (Some(info.url.clone()), Some(info.title.clone())),
        None => (None, None),
    }
}

/// Page-type targets, in the order DevTools reports them (newest first).
async fn page_targets(client: &Arc<CdpClient>) -> crate::cdp::client::Result<Vec<TargetInfo>> {
    let result = client.send("Target.getTargets", None, None).await?;
    let infos: Vec<TargetInfo> = serde_json::from_value(
        result
            .get("targetInfos")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
    )?;
    Ok(infos
        .into_iter()
        .filter(|t| t.target_type == "page")
        .collect())
}

async fn most_recent_tab(client: &Arc<CdpClient>) -> Result<Option<Tab>> {
    let targets = page_targets(client).await.map_err(BrowserError::Cdp)?;
    match targets.into_iter().next() {
        Some(info) => Ok(Some(Tab::attach(client.clone(), info.target_id).await?)),
        None => Ok(None),
    }
}

async fn create_tab(client: &Arc<CdpClient>, url: &str) -> Result<Tab> {
    let result = client
        .send("Target.createTarget", Some(json!({ "url": url })), None)
        .await
        .map_err(BrowserError::Cdp)?;
    let target_id = result
        .get("targetId")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            BrowserError::Cdp(CdpError::UnexpectedResponse(
                "createTarget returned no targetId".into(),
            ))
        })?;
    Ok(Tab::attach(client.clone(), target_id.to_string()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_options_bind_from_argument_map() {
        let options: LaunchOptions = serde_json::from_value(serde_json::json!({
            "headless": true,
            "window_size": [800, 600],
        }))
        .unwrap();
        assert!(options.headless);
        assert_eq!(options.window_size, (800, 600));
        assert_eq!(options.debug_port, 9222);
        assert!(options.user_agent.is_none());
    }

    #[test]
    fn launch_options_defaults() {
        let options = LaunchOptions::default();
        assert!(!options.headless);
        assert_eq!(options.window_size, (1920, 1080));
    }

    #[test]
    fn tab_count_keeps_probe_cause() {
        let approx = TabCount::Approximate {
            count: 1,
            cause: "connection closed".into(),
        };
        assert_eq!(approx.count(), 1);
        assert_ne!(approx, TabCount::Accurate(1));
    }

    #[tokio::test]
    async fn status_without_session_is_not_running() {
        let manager = SessionManager::new();
        let status = manager.status().await;
        assert!(!status.running);
        assert!(status.tab_count.is_none());
    }

    #[tokio::test]
    async fn current_tab_without_session_errors() {
        let manager = SessionManager::new();
        assert!(matches!(
            manager.current_tab().await,
            Err(BrowserError::NotRunning)
        ));
    }

    #[tokio::test]
    #[ignore] // needs a Chromium binary on this machine
    async fn concurrent_init_launches_exactly_once() {
        let manager = Arc::new(SessionManager::new());
        let options = LaunchOptions {
            headless: true,
            ..Default::default()
        };

        let a = {
            let manager = manager.clone();
            let options = options.clone();
            tokio::spawn(async move { manager.init(options).await })
        };
        let b = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.init(options).await })
        };

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        let launches = [&a, &b]
            .iter()
            .filter(|o| matches!(o, InitOutcome::Launched(_)))
            .count();
        assert_eq!(launches, 1);

        manager.close().await.unwrap();
        assert!(!manager.status().await.running);
    }

    #[tokio::test]
    #[ignore] // needs a Chromium binary on this machine
    async fn close_is_idempotent_and_clears_state() {
        let manager = SessionManager::new();
        manager
            .init(LaunchOptions {
                headless: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(manager.is_running().await);

        manager.close().await.unwrap();
        assert!(!manager.status().await.running);
        // A second close is a no-op.
        manager.close().await.unwrap();
    }
}
