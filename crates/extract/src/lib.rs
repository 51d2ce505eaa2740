//! Deterministic content extraction over serialized HTML.
//!
//! Everything here is a pure function from an HTML string (plus config) to
//! structured output: sanitized HTML, Markdown/text, table records, or
//! field-mapped records. No browser dependency, so the whole pipeline is
//! unit-testable and idempotent on a static document.

pub mod config;
pub mod convert;
pub mod error;
pub mod records;
pub mod sanitize;
pub mod table;

pub use config::{ExtractionConfig, OutputFormat};
pub use convert::{collapse_blank_lines, convert_page, ConversionStats};
pub use error::{ExtractError, Result};
pub use records::extract_records;
pub use sanitize::{extract_main, sanitize};
pub use table::{extract_table, TableData};
