//! Extraction configuration. Plain values, no shared state.

use serde::{Deserialize, Serialize};

/// Output format for page content conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Text,
    Html,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "markdown" => Some(Self::Markdown),
            "text" => Some(Self::Text),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Knobs for the sanitize-and-convert pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub include_images: bool,
    pub remove_ads: bool,
    pub extract_main: bool,
    pub add_metadata: bool,
    pub format: OutputFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_images: true,
            remove_ads: true,
            extract_main: true,
            add_metadata: true,
            format: OutputFormat::Markdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_known_values_only() {
        assert_eq!(OutputFormat::parse("markdown"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("html"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::parse("pdf"), None);
    }
}
