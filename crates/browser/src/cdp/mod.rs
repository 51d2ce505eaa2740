//! CDP (Chrome DevTools Protocol) client.
//!
//! One WebSocket per browser, multiplexed across attached targets. Requests
//! are matched to responses by id; events fan out to subscribers.

pub mod client;
pub mod protocol;

pub use client::{CdpClient, CdpError};
pub use protocol::{CdpEvent, CdpRequest, CdpResponse};
