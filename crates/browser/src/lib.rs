//! Browser control: one Chromium process, one current tab, CDP underneath.
//!
//! The [`SessionManager`] owns the single browser instance and hands out
//! [`Tab`] handles; the [`locator`] module resolves selectors against the
//! current page. Higher layers build JSON-map operations on top of these
//! primitives and never talk CDP directly.

pub mod cdp;
pub mod error;
pub mod launcher;
pub mod locator;
pub mod session;
pub mod tab;

pub use error::BrowserError;
pub use locator::{ElementInfo, Found, Selector};
pub use session::{InitOutcome, LaunchOptions, SessionManager, Status, TabCount};
pub use tab::Tab;
