//! Visible-text extraction. Strips non-visible structural nodes and
//! segments what remains into block-level text chunks at natural
//! paragraph boundaries.

use scraper::ego_tree::NodeRef;
use scraper::{Html, Node};

/// Subtrees that never contribute visible text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "form", "button", "svg",
    "select", "option", "iframe", "template", "head",
];

/// Elements whose boundaries start a new text block.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "blockquote", "article", "section", "main", "h1", "h2", "h3", "h4", "h5",
    "h6", "tr", "td", "table", "ul", "ol", "pre", "dd", "dt", "br", "hr",
];

/// Extract visible text blocks from an HTML document. Whitespace inside a
/// block is collapsed; empty blocks are dropped. Block order follows
/// document order, but callers must not rely on it for correctness.
pub fn visible_blocks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut blocks = Vec::new();
    let mut current = String::new();
    collect(document.tree.root(), &mut blocks, &mut current);
    flush(&mut current, &mut blocks);
    blocks
}

/// All visible text of a document, blocks joined by newlines.
pub fn visible_text(html: &str) -> String {
    visible_blocks(html).join("\n")
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect(node: NodeRef<'_, Node>, blocks: &mut Vec<String>, current: &mut String) {
    match node.value() {
        Node::Element(el) => {
            let tag = el.name();
            if SKIP_TAGS.contains(&tag) {
                return;
            }
            let is_block = BLOCK_TAGS.contains(&tag);
            if is_block {
                flush(current, blocks);
            }
            for child in node.children() {
                collect(child, blocks, current);
            }
            if is_block {
                flush(current, blocks);
            }
        }
        Node::Text(text) => {
            current.push_str(text);
            current.push(' ');
        }
        _ => {
            for child in node.children() {
                collect(child, blocks, current);
            }
        }
    }
}

fn flush(current: &mut String, blocks: &mut Vec<String>) {
    let collapsed = collapse_whitespace(current);
    if !collapsed.is_empty() {
        blocks.push(collapsed);
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style() {
        let html = r#"<html><body>
            <script>var x = "not visible";</script>
            <style>.a { color: red }</style>
            <p>Visible paragraph.</p>
        </body></html>"#;
        let text = visible_text(html);
        assert_eq!(text, "Visible paragraph.");
    }

    #[test]
    fn strips_nav_and_footer() {
        let html = r#"<body>
            <nav><a href="/">Home</a></nav>
            <p>Content here.</p>
            <footer>Copyright 2026</footer>
        </body>"#;
        let text = visible_text(html);
        assert_eq!(text, "Content here.");
    }

    #[test]
    fn paragraphs_become_separate_blocks() {
        let html = "<body><p>First block.</p><p>Second block.</p></body>";
        let blocks = visible_blocks(html);
        assert_eq!(blocks, vec!["First block.", "Second block."]);
    }

    #[test]
    fn inline_markup_stays_in_one_block() {
        let html = "<body><p>Works <b>really</b> well for the price.</p></body>";
        let blocks = visible_blocks(html);
        assert_eq!(blocks, vec!["Works really well for the price."]);
    }

    #[test]
    fn nested_divs_do_not_duplicate_text() {
        let html = "<body><div><div><p>Once only.</p></div></div></body>";
        let text = visible_text(html);
        assert_eq!(text, "Once only.");
    }

    #[test]
    fn collapses_internal_whitespace() {
        let html = "<body><p>spaced   \n\t  out</p></body>";
        assert_eq!(visible_text(html), "spaced out");
    }

    #[test]
    fn empty_document_yields_no_blocks() {
        assert!(visible_blocks("").is_empty());
        assert!(visible_blocks("<html><head><title>t</title></head></html>").is_empty());
    }
}
