//! Form fill: per-field tag/type normalization, best-effort across fields.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::warn;

use browser::locator::js_string;
use browser::{BrowserError, SessionManager, Tab};

use crate::args;
use crate::elements::click_once;
use crate::error::{OpError, OpResult};

pub async fn fill_form(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let fields = args
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| OpError::InvalidArgument("missing required argument: fields".into()))?;
    let submit_selector = args::opt_str(args, "submit_selector");
    let wait_after_submit = args::opt_f64(args, "wait_after_submit", 2.0);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    let mut filled_fields: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for (selector, value) in fields {
        match fill_field(&tab, selector, value).await {
            Ok(()) => filled_fields.push(selector.clone()),
            Err(e) => {
                warn!(selector = %selector, error = %e, "form field failed");
                errors.push(format!("{selector}: {e}"));
            }
        }
    }

    let mut submitted = false;
    if let Some(submit) = submit_selector {
        match click_once(&tab, submit).await {
            Ok(true) => {
                tokio::time::sleep(Duration::from_secs_f64(wait_after_submit)).await;
                submitted = true;
            }
            Ok(false) => errors.push(format!("submit control not found: {submit}")),
            Err(e) => errors.push(format!("submit failed: {e}")),
        }
    }

    Ok(json!({
        "success": errors.is_empty(),
        "filled_fields": filled_fields,
        "submitted": submitted,
        "errors": errors,
    }))
}

/// Write one field, dispatching on the element's tag and input type:
/// checkboxes and radios toggle only on a state mismatch, selects pick the
/// option matching value or label, everything else is cleared and typed.
async fn fill_field(tab: &Tab, selector: &str, value: &Value) -> Result<(), OpError> {
    let expr = fill_expr(selector, value);
    let result = tab.evaluate(&expr).await.map_err(BrowserError::from)?;
    if result.is_null() {
        Ok(())
    } else {
        Err(OpError::NotFound {
            what: "form field",
            target: selector.to_string(),
        })
    }
}

fn fill_expr(selector: &str, value: &Value) -> String {
    format!(
        "(() => {{ const el = document.querySelector({sel}); \
         if (!el) return 'missing'; \
         const tag = el.tagName.toLowerCase(); \
         const type = (el.getAttribute('type') || '').toLowerCase(); \
         if (tag === 'input' && (type === 'checkbox' || type === 'radio')) {{ \
           if (el.checked !== {truthy}) el.click(); \
         }} else if (tag === 'select') {{ \
           const want = {text}; \
           const opt = Array.from(el.options).find(o => \
             o.value === want || o.textContent.trim() === want); \
           el.value = opt ? opt.value : want; \
           el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         }} else {{ \
           el.value = ''; el.value = {text}; \
           el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
           el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         }} return null; }})()",
        sel = js_string(selector),
        truthy = value_truthy(value),
        text = js_string(&value_text(value)),
    )
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::Null => false,
        _ => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_wire_values() {
        assert!(value_truthy(&json!(true)));
        assert!(!value_truthy(&json!(false)));
        assert!(value_truthy(&json!("yes")));
        assert!(!value_truthy(&json!("")));
        assert!(value_truthy(&json!(1)));
        assert!(!value_truthy(&json!(0)));
        assert!(!value_truthy(&Value::Null));
    }

    #[test]
    fn fill_expr_handles_checkbox_and_select_branches() {
        let expr = fill_expr("#agree", &json!(true));
        assert!(expr.contains("checkbox"));
        assert!(expr.contains("el.checked !== true"));

        let expr = fill_expr("#country", &json!("DE"));
        assert!(expr.contains("el.options"));
        assert!(expr.contains(r#""DE""#));
    }

    #[test]
    fn fill_expr_escapes_selector() {
        let expr = fill_expr("input[name=\"q\"]", &json!("x"));
        assert!(expr.contains(r#"input[name=\"q\"]"#));
    }
}
