//! HTML cleanup: structural removal of non-content subtrees and
//! main-content narrowing.

use std::sync::LazyLock;

use ego_tree::NodeId;
use scraper::{Html, Selector};

// Fixed selectors are parsed once and cached; a parse failure here is a
// compile-time-class bug, not a runtime condition.

/// Subtrees that never carry article content.
static NOISE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "script",
        "style",
        "iframe",
        "noscript",
        "[class*=\"ad-\"]",
        "[class*=\"advertisement\"]",
        "[id*=\"ad-\"]",
        "[id*=\"advertisement\"]",
        ".sidebar",
        ".footer",
        ".header-ad",
        "[class*=\"social-share\"]",
        "[class*=\"cookie\"]",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("fixed denylist selector"))
    .collect()
});

/// Main-content candidates, highest priority first.
static MAIN_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "article",
        "[role=\"main\"]",
        ".main-content",
        "#main-content",
        ".content",
        "#content",
        ".post-content",
        ".article-content",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("fixed main-content selector"))
    .collect()
});

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("fixed body selector"));

/// Remove every denylisted subtree. Deletion is structural: the node and
/// all descendants go. Overlapping matches are harmless - detaching a node
/// whose ancestor is already detached changes nothing in the output.
pub fn sanitize(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let doomed: Vec<NodeId> = NOISE_SELECTORS
        .iter()
        .flat_map(|selector| document.select(selector).map(|element| element.id()))
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.root_element().html()
}

/// Narrow a document to its most likely content subtree: first match in the
/// fixed priority list, then `<body>`, then the document as given. Ordered
/// fallback is the design here - no match is never an error.
pub fn extract_main(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in MAIN_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            return element.html();
        }
    }

    if let Some(body) = document.select(&BODY_SELECTOR).next() {
        return body.html();
    }

    html.to_string()
}
