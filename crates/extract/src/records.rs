//! Field-mapped record extraction.
//!
//! One container selector matches the repeating items; each named field
//! resolves its own sub-selector inside every container. Field values are
//! normalized by tag, and a field that matches nothing is `null` - one bad
//! field never drops the record.

use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};

use crate::error::{ExtractError, Result};

/// Extract up to `limit` records from `html`.
///
/// Fails only on prerequisite problems: an unparseable container selector,
/// or a container selector that matches nothing at all.
pub fn extract_records(
    html: &str,
    container_selector: &str,
    fields: &[(String, String)],
    limit: usize,
) -> Result<Vec<Value>> {
    let document = Html::parse_document(html);
    let container = Selector::parse(container_selector)
        .map_err(|e| ExtractError::InvalidSelector(format!("{container_selector}: {e}")))?;

    let containers: Vec<ElementRef> = document.select(&container).take(limit).collect();
    if containers.is_empty() {
        return Err(ExtractError::NoMatch(container_selector.to_string()));
    }

    let mut records = Vec::with_capacity(containers.len());
    for container in containers {
        let mut record = Map::new();
        for (name, sub_selector) in fields {
            record.insert(name.clone(), field_value(container, sub_selector));
        }
        records.push(Value::Object(record));
    }
    Ok(records)
}

/// Normalize one field by tag: images yield their source, links yield
/// text plus href, everything else yields trimmed text.
fn field_value(container: ElementRef<'_>, sub_selector: &str) -> Value {
    let Ok(selector) = Selector::parse(sub_selector) else {
        return Value::Null;
    };
    let Some(element) = container.select(&selector).next() else {
        return Value::Null;
    };

    match element.value().name() {
        "img" => element
            .value()
            .attr("src")
            .map(|src| Value::String(src.to_string()))
            .unwrap_or(Value::Null),
        "a" => json!({
            "text": text_of(element),
            "href": element.value().attr("href").unwrap_or(""),
        }),
        _ => Value::String(text_of(element)),
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<html><body>
        <div class="item">
            <h2>First</h2>
            <a href="/one">read</a>
            <img src="/one.png">
        </div>
        <div class="item">
            <h2>  Second  </h2>
            <a href="/two">more</a>
        </div>
        <div class="item">
            <h2>Third</h2>
        </div>
    </body></html>"#;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn extracts_one_record_per_container() {
        let records =
            extract_records(LISTING, "div.item", &fields(&[("title", "h2")]), 100).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["title"], "First");
        assert_eq!(records[1]["title"], "Second"); // trimmed
        assert_eq!(records[2]["title"], "Third");
    }

    #[test]
    fn links_and_images_are_tag_normalized() {
        let records = extract_records(
            LISTING,
            "div.item",
            &fields(&[("link", "a"), ("cover", "img")]),
            100,
        )
        .unwrap();

        assert_eq!(records[0]["link"]["text"], "read");
        assert_eq!(records[0]["link"]["href"], "/one");
        assert_eq!(records[0]["cover"], "/one.png");
        // Second item has no image.
        assert_eq!(records[1]["cover"], Value::Null);
    }

    #[test]
    fn missing_field_is_null_in_every_record() {
        let records =
            extract_records(LISTING, "div.item", &fields(&[("price", ".price")]), 100).unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record["price"], Value::Null);
        }
    }

    #[test]
    fn limit_caps_containers() {
        let records =
            extract_records(LISTING, "div.item", &fields(&[("title", "h2")]), 2).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn no_containers_is_a_prerequisite_failure() {
        assert!(matches!(
            extract_records(LISTING, ".absent", &fields(&[("t", "h2")]), 10),
            Err(ExtractError::NoMatch(_))
        ));
    }

    #[test]
    fn bad_sub_selector_nulls_the_field_only() {
        let records = extract_records(
            LISTING,
            "div.item",
            &fields(&[("title", "h2"), ("broken", "!!!")]),
            100,
        )
        .unwrap();
        assert_eq!(records[0]["title"], "First");
        assert_eq!(records[0]["broken"], Value::Null);
    }
}
