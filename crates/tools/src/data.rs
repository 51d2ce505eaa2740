//! Structured read operations: table extraction and smart extract.
//!
//! Both run the extraction pipeline over the page's captured HTML, so the
//! results are deterministic for a static document.

use std::sync::Arc;

use serde_json::{json, Value};

use browser::{BrowserError, SessionManager};

use crate::args;
use crate::error::{OpError, OpResult};
use crate::output::write_output;

pub async fn extract_table_data(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::opt_str(args, "selector").unwrap_or("table");
    let format = args::opt_str(args, "format").unwrap_or("json");
    let include_header = args::opt_bool(args, "include_header", true);
    let output_file = args::opt_str(args, "output_file");

    manager.ensure().await?;
    let tab = manager.current_tab().await?;
    let html = tab.html().await.map_err(BrowserError::from)?;

    let table = extract::extract_table(&html, selector)?;

    match format {
        "json" => {
            let data = json!({
                "headers": if include_header { json!(table.headers) } else { Value::Null },
                "rows": table.records(),
                "row_count": table.rows.len(),
            });
            let mut result = json!({ "success": true, "format": "json", "data": data });
            if let Some(path) = output_file {
                let pretty = serde_json::to_string_pretty(&data)?;
                result["output_file"] = json!(write_output(path, pretty.as_bytes())?);
            }
            Ok(result)
        }
        "csv" => {
            let csv_text = table.to_csv(include_header)?;
            let path = output_file.unwrap_or("table_data.csv");
            let absolute = write_output(path, csv_text.as_bytes())?;
            Ok(json!({
                "success": true,
                "format": "csv",
                "row_count": table.rows.len(),
                "column_count": table.column_count(),
                "output_file": absolute,
            }))
        }
        other => Err(OpError::InvalidArgument(format!(
            "unsupported format: {other}"
        ))),
    }
}

pub async fn smart_extract(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let selector = args::str_arg(args, "selector")?;
    let fields = parse_fields(args)?;
    let limit = args::opt_usize(args, "limit", 100);

    manager.ensure().await?;
    let tab = manager.current_tab().await?;
    let html = tab.html().await.map_err(BrowserError::from)?;

    let records = extract::extract_records(&html, selector, &fields, limit)?;

    Ok(json!({
        "success": true,
        "count": records.len(),
        "data": records,
    }))
}

/// The `fields` map: field name -> sub-selector, in caller order.
fn parse_fields(args: &Value) -> Result<Vec<(String, String)>, OpError> {
    let map = args
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| OpError::InvalidArgument("missing required argument: fields".into()))?;

    map.iter()
        .map(|(name, selector)| {
            selector
                .as_str()
                .map(|s| (name.clone(), s.to_string()))
                .ok_or_else(|| {
                    OpError::InvalidArgument(format!("field {name} selector must be a string"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_preserve_caller_order() {
        let args = json!({ "fields": { "title": "h2", "author": ".by", "date": "time" } });
        let fields = parse_fields(&args).unwrap();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["title", "author", "date"]);
    }

    #[test]
    fn non_string_sub_selector_is_invalid() {
        let args = json!({ "fields": { "title": 7 } });
        assert!(matches!(
            parse_fields(&args),
            Err(OpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_fields_is_invalid() {
        assert!(matches!(
            parse_fields(&json!({})),
            Err(OpError::InvalidArgument(_))
        ));
    }
}
