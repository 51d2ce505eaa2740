//! Argument extraction from the wire-level JSON map.

use std::time::Duration;

use serde_json::Value;

use browser::Selector;

use crate::error::OpError;

pub fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, OpError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| OpError::InvalidArgument(format!("missing required argument: {key}")))
}

pub fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub fn opt_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn opt_f64(args: &Value, key: &str, default: f64) -> f64 {
    args.get(key).and_then(Value::as_f64).unwrap_or(default)
}

pub fn opt_u64(args: &Value, key: &str, default: u64) -> u64 {
    args.get(key).and_then(Value::as_u64).unwrap_or(default)
}

pub fn opt_usize(args: &Value, key: &str, default: usize) -> usize {
    args.get(key)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(default)
}

/// Build the unified selector from `selector` + optional `selector_type`.
pub fn selector_arg(args: &Value) -> Result<Selector, OpError> {
    let raw = str_arg(args, "selector")?;
    let kind = opt_str(args, "selector_type").unwrap_or("css");
    Selector::from_kind(kind, raw)
        .ok_or_else(|| OpError::InvalidArgument(format!("unsupported selector type: {kind}")))
}

/// Caller timeout in seconds, clamped to non-negative.
pub fn timeout_arg(args: &Value, default_secs: f64) -> Duration {
    Duration::from_secs_f64(opt_f64(args, "timeout", default_secs).max(0.0))
}
