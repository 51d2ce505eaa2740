//! Operation-level failures.
//!
//! Every public operation funnels its errors into [`OpError`]; the
//! dispatcher renders them as `{success: false, error}` maps. Nothing
//! crosses the dispatch boundary as a panic or a raw `Err`.

use thiserror::Error;

pub type OpResult = std::result::Result<serde_json::Value, OpError>;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{what} not found: {target}")]
    NotFound { what: &'static str, target: String },

    #[error("timed out after {elapsed_secs:.1}s waiting for {what}")]
    Timeout { what: String, elapsed_secs: f64 },

    #[error(transparent)]
    Browser(#[from] browser::BrowserError),

    #[error(transparent)]
    Extract(#[from] extract::ExtractError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
