//! Table extraction: one table subtree in, ordered header/rows out.
//!
//! Header resolution falls back in a fixed order (`thead th` -> `thead td`
//! -> first row), and body rows avoid double-counting a first row that
//! served as the header. Ragged rows are kept as-is; record projection
//! trims them against the header.

use std::sync::LazyLock;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};

static THEAD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("thead").expect("fixed selector"));
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("fixed selector"));
static TH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").expect("fixed selector"));
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("fixed selector"));
static BODY_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("fixed selector"));

/// Ordered table content. `headers` is `None` when nothing header-like was
/// found, in which case rows are positional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Rows as JSON records: keyed in header order when a header exists,
    /// positional arrays otherwise. Cells beyond the header are dropped;
    /// missing trailing cells leave their keys absent.
    pub fn records(&self) -> Vec<Value> {
        match &self.headers {
            Some(headers) => self
                .rows
                .iter()
                .map(|row| {
                    let mut record = Map::new();
                    for (key, value) in headers.iter().zip(row.iter()) {
                        record.insert(key.clone(), Value::String(value.clone()));
                    }
                    Value::Object(record)
                })
                .collect(),
            None => self
                .rows
                .iter()
                .map(|row| Value::Array(row.iter().cloned().map(Value::String).collect()))
                .collect(),
        }
    }

    /// CSV rendition of the same header/row data.
    pub fn to_csv(&self, include_header: bool) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        if include_header {
            if let Some(headers) = &self.headers {
                writer.write_record(headers)?;
            }
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExtractError::Conversion(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExtractError::Conversion(e.to_string()))
    }

    pub fn column_count(&self) -> usize {
        match &self.headers {
            Some(headers) => headers.len(),
            None => self.rows.first().map(Vec::len).unwrap_or(0),
        }
    }
}

/// Find the first element matching `table_selector` and read it as a table.
pub fn extract_table(html: &str, table_selector: &str) -> Result<TableData> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(table_selector)
        .map_err(|e| ExtractError::InvalidSelector(format!("{table_selector}: {e}")))?;
    let table = document
        .select(&selector)
        .next()
        .ok_or_else(|| ExtractError::NoMatch(table_selector.to_string()))?;
    Ok(read_table(table))
}

fn read_table(table: ElementRef<'_>) -> TableData {
    let mut header_row_id: Option<NodeId> = None;
    let mut headers: Vec<String> = Vec::new();

    if let Some(head) = table.select(&THEAD).next() {
        headers = head.select(&TH).map(cell_text).collect();
        if headers.is_empty() {
            headers = head.select(&TD).map(cell_text).collect();
        }
    }
    if headers.is_empty() {
        if let Some(first_row) = table.select(&TR).next() {
            headers = row_cells(first_row);
            if !headers.is_empty() {
                header_row_id = Some(first_row.id());
            }
        }
    }

    // The parser wraps loose rows in an implicit tbody, so "tbody tr" is
    // every body row whether or not the author wrote one. A first row that
    // doubled as the header is dropped so it is not also counted as data.
    let rows: Vec<Vec<String>> = table
        .select(&BODY_ROWS)
        .filter(|row| Some(row.id()) != header_row_id)
        .map(row_cells)
        .filter(|cells| !cells.is_empty())
        .collect();

    TableData {
        headers: if headers.is_empty() { None } else { Some(headers) },
        rows,
    }
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    let cells: Vec<String> = row.select(&TD).map(cell_text).collect();
    if cells.is_empty() {
        row.select(&TH).map(cell_text).collect()
    } else {
        cells
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_and_one_data_row() {
        let html = "<table><tr><th>A</th><th>B</th></tr>\
                    <tr><td>1</td><td>2</td></tr></table>";
        let table = extract_table(html, "table").unwrap();

        assert_eq!(table.headers, Some(vec!["A".into(), "B".into()]));
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);

        let records = table.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["A"], "1");
        assert_eq!(records[0]["B"], "2");
    }

    #[test]
    fn thead_th_wins_over_first_row() {
        let html = "<table><thead><tr><th>Name</th><th>Age</th></tr></thead>\
                    <tbody><tr><td>Ada</td><td>36</td></tr></tbody></table>";
        let table = extract_table(html, "table").unwrap();
        assert_eq!(table.headers, Some(vec!["Name".into(), "Age".into()]));
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn thead_td_fallback() {
        let html = "<table><thead><tr><td>X</td><td>Y</td></tr></thead>\
                    <tbody><tr><td>1</td><td>2</td></tr></tbody></table>";
        let table = extract_table(html, "table").unwrap();
        assert_eq!(table.headers, Some(vec!["X".into(), "Y".into()]));
    }

    #[test]
    fn no_tbody_skips_header_row_in_data() {
        let html = "<table><tr><th>H1</th><th>H2</th></tr>\
                    <tr><td>a</td><td>b</td></tr>\
                    <tr><td>c</td><td>d</td></tr></table>";
        let table = extract_table(html, "table").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["a", "b"]);
    }

    #[test]
    fn zero_cell_rows_are_dropped() {
        let html = "<table><thead><tr><th>H</th></tr></thead>\
                    <tbody><tr><td>only</td></tr><tr></tr></tbody></table>";
        let table = extract_table(html, "table").unwrap();
        assert_eq!(table.rows, vec![vec!["only".to_string()]]);
    }

    #[test]
    fn ragged_rows_trim_against_header() {
        let html = "<table><tr><th>A</th><th>B</th></tr>\
                    <tr><td>1</td><td>2</td><td>3</td></tr>\
                    <tr><td>only</td></tr></table>";
        let table = extract_table(html, "table").unwrap();
        let records = table.records();

        // Extra cell dropped.
        assert_eq!(records[0].as_object().unwrap().len(), 2);
        // Missing trailing cell leaves the key absent.
        let short = records[1].as_object().unwrap();
        assert_eq!(short.len(), 1);
        assert_eq!(short["A"], "only");
        assert!(!short.contains_key("B"));
    }

    #[test]
    fn headerless_rows_are_positional() {
        let data = TableData {
            headers: None,
            rows: vec![vec!["1".into(), "2".into()]],
        };
        let records = data.records();
        assert_eq!(records[0], serde_json::json!(["1", "2"]));
    }

    #[test]
    fn missing_table_is_no_match() {
        assert!(matches!(
            extract_table("<div>nothing</div>", "table"),
            Err(ExtractError::NoMatch(_))
        ));
    }

    #[test]
    fn csv_round_trip_matches_rows() {
        let html = "<table><tr><th>A</th><th>B</th></tr>\
                    <tr><td>1</td><td>2</td></tr></table>";
        let table = extract_table(html, "table").unwrap();
        let csv = table.to_csv(true).unwrap();
        assert_eq!(csv, "A,B\n1,2\n");
        assert_eq!(table.column_count(), 2);

        let headerless = table.to_csv(false).unwrap();
        assert_eq!(headerless, "1,2\n");
    }
}
