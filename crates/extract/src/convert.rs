//! HTML to Markdown / plain text conversion.
//!
//! Markdown comes out of `htmd` with ATX headings and `-` bullets. All
//! formats share the same post-processing: runs of three or more newlines
//! collapse to a single blank line, and that collapse is idempotent.

use htmd::options::{BulletListMarker, HeadingStyle, Options};
use htmd::HtmlToMarkdown;
use scraper::Html;
use serde::Serialize;

use crate::config::{ExtractionConfig, OutputFormat};
use crate::error::{ExtractError, Result};
use crate::sanitize;

/// Tags stripped during markdown conversion regardless of config.
const SKIP_TAGS: &[&str] = &["script", "style"];

/// Full pipeline: narrow to main content, strip noise, convert, prepend
/// metadata, normalize spacing. Metadata goes in before the blank-line
/// collapse so its spacing is normalized exactly like the body's.
pub fn convert_page(
    html: &str,
    title: &str,
    url: &str,
    config: &ExtractionConfig,
) -> Result<String> {
    let html = if config.extract_main {
        sanitize::extract_main(html)
    } else {
        html.to_string()
    };
    let html = if config.remove_ads {
        sanitize::sanitize(&html)
    } else {
        html
    };

    let body = match config.format {
        OutputFormat::Html => html,
        OutputFormat::Text => to_text(&html),
        OutputFormat::Markdown => to_markdown(&html, config.include_images)?,
    };

    let full = if config.add_metadata {
        format!("{}{}", metadata_block(title, url), body)
    } else {
        body
    };

    Ok(collapse_blank_lines(&full))
}

/// Collapse runs of three or more newlines down to a single blank line.
/// Applying it twice is the same as applying it once.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;

    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            continue;
        }
        flush_newlines(&mut out, newlines);
        newlines = 0;
        out.push(ch);
    }
    flush_newlines(&mut out, newlines);
    out
}

fn flush_newlines(out: &mut String, count: usize) {
    let count = if count >= 3 { 2 } else { count };
    for _ in 0..count {
        out.push('\n');
    }
}

/// Line/character/word counts for a converted document.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    pub lines: usize,
    pub characters: usize,
    pub words: usize,
}

pub fn stats(text: &str) -> ConversionStats {
    ConversionStats {
        lines: text.split('\n').count(),
        characters: text.chars().count(),
        words: text.split_whitespace().count(),
    }
}

fn metadata_block(title: &str, url: &str) -> String {
    format!("# {title}\n\n**URL**: {url}\n\n---\n\n")
}

fn to_markdown(html: &str, include_images: bool) -> Result<String> {
    let mut skip: Vec<&str> = SKIP_TAGS.to_vec();
    if !include_images {
        skip.push("img");
    }

    let converter = HtmlToMarkdown::builder()
        .skip_tags(skip)
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ul_bullet_spacing: 1,
            ..Default::default()
        })
        .build();

    converter
        .convert(html)
        .map_err(|e| ExtractError::Conversion(e.to_string()))
}

/// Plain-text rendition: every text node, whitespace-normalized.
fn to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markdown_config() -> ExtractionConfig {
        ExtractionConfig {
            add_metadata: false,
            extract_main: false,
            ..Default::default()
        }
    }

    #[test]
    fn collapse_is_idempotent() {
        let cases = [
            "a\n\n\n\n\nb\n\n\n\nc",
            "\n\n\n",
            "no newlines",
            "one\ntwo\n\nthree",
            "",
        ];
        for text in cases {
            let once = collapse_blank_lines(text);
            assert_eq!(collapse_blank_lines(&once), once, "input: {text:?}");
            assert!(!once.contains("\n\n\n"));
        }
    }

    #[test]
    fn collapse_keeps_single_and_double_newlines() {
        assert_eq!(collapse_blank_lines("a\nb"), "a\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn markdown_uses_atx_headings_and_dash_bullets() {
        let html = "<h1>Title</h1><ul><li>one</li><li>two</li></ul>";
        let md = convert_page(html, "", "", &markdown_config()).unwrap();
        assert!(md.contains("# Title"));
        assert!(md.contains("- one"));
        assert!(md.contains("- two"));
    }

    #[test]
    fn image_toggle_is_respected() {
        let html = r#"<p>before</p><img src="/pic.png" alt="pic"><p>after</p>"#;

        let with = convert_page(html, "", "", &markdown_config()).unwrap();
        assert!(with.contains("/pic.png"));

        let without = convert_page(
            html,
            "",
            "",
            &ExtractionConfig {
                include_images: false,
                ..markdown_config()
            },
        )
        .unwrap();
        assert!(!without.contains("/pic.png"));
        assert!(without.contains("before"));
        assert!(without.contains("after"));
    }

    #[test]
    fn metadata_is_prepended_once_and_normalized() {
        let html = "<p>body text</p>";
        let config = ExtractionConfig {
            add_metadata: true,
            extract_main: false,
            ..Default::default()
        };
        let md = convert_page(html, "Page Title", "https://example.com/a", &config).unwrap();

        assert!(md.starts_with("# Page Title\n"));
        assert_eq!(md.matches("**URL**: https://example.com/a").count(), 1);
        assert!(md.contains("---"));
        assert!(!md.contains("\n\n\n"));
        assert!(md.contains("body text"));
    }

    #[test]
    fn text_format_flattens_markup() {
        let html = "<div><p>alpha</p>\n<p>beta</p></div>";
        let config = ExtractionConfig {
            format: OutputFormat::Text,
            ..markdown_config()
        };
        let text = convert_page(html, "", "", &config).unwrap();
        assert_eq!(text, "alpha beta");
    }

    #[test]
    fn html_format_passes_subtree_through() {
        let html = "<html><body><main><p>kept</p></main></body></html>";
        let config = ExtractionConfig {
            format: OutputFormat::Html,
            extract_main: true,
            add_metadata: false,
            ..Default::default()
        };
        let out = convert_page(html, "", "", &config).unwrap();
        // The sanitizer re-serializes through a full document, so the main
        // subtree survives inside a document wrapper.
        assert!(out.contains("<p>kept</p>"));
        assert!(out.contains("<main>"));
    }

    #[test]
    fn remove_ads_applies_inside_conversion() {
        let html = r#"<body><script>tracker()</script><p>visible</p></body>"#;
        let md = convert_page(html, "", "", &markdown_config()).unwrap();
        assert!(!md.contains("tracker"));
        assert!(md.contains("visible"));
    }

    #[test]
    fn stats_count_lines_words_characters() {
        let s = stats("one two\nthree");
        assert_eq!(s.lines, 2);
        assert_eq!(s.words, 3);
        assert_eq!(s.characters, 13);
    }
}
