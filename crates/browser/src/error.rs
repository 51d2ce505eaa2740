//! Error types for browser control.

use thiserror::Error;

use crate::cdp::CdpError;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no chromium binary found on this system")]
    ChromeNotFound,

    #[error("failed to launch chromium: {0}")]
    LaunchFailed(String),

    #[error("browser is not running")]
    NotRunning,

    #[error("no tab is available")]
    NoTab,

    #[error(transparent)]
    Cdp(#[from] CdpError),
}
