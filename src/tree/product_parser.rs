//! Reference tree parser for `Name/Version (comment; entries)` style input.
//!
//! This is deliberately small. It recognises products, versions and comment
//! blocks, which is enough for the bundled demo ruleset and the CLI. Real
//! deployments plug in their own [`TreeParser`].
//!
//! ```text
//! "Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0"
//!
//! agent
//! ├─ product  "Mozilla/5.0 (X11; Linux x86_64)"
//! │  ├─ name     "Mozilla"
//! │  ├─ version  "5.0"
//! │  └─ comments "(X11; Linux x86_64)"
//! │     ├─ entry "X11"          └─ word "X11"
//! │     └─ entry "Linux x86_64" ├─ word "Linux"
//! │                             └─ word "x86_64"
//! └─ product  "Firefox/120.0"
//!    ├─ name     "Firefox"
//!    └─ version  "120.0"
//! ```

use super::{NodeId, SyntaxTree, TreeBuilder, TreeParser};
use std::ops::Range;

/// Splits a product token into `name` and optional `version`.
fn product_parts(token: &str) -> Option<(Range<usize>, Option<Range<usize>>)> {
    let caps = crate::regex!(r"^(?P<name>[^/]+)(?:/(?P<version>.+))?$").captures(token)?;
    let name = caps.name("name")?.range();
    let version = caps.name("version").map(|m| m.range());
    Some((name, version))
}

/// Basic `TreeParser` producing `agent`/`product`/`name`/`version`/`comments`/
/// `entry`/`word` nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductTreeParser;

impl TreeParser for ProductTreeParser {
    fn parse(&self, input: &str) -> SyntaxTree {
        let mut builder = TreeBuilder::new(input, "agent");
        let root = builder.root();
        let bytes = input.as_bytes();
        let mut pos = 0;
        let mut last_product: Option<(NodeId, bool)> = None;

        while pos < bytes.len() {
            if bytes[pos].is_ascii_whitespace() {
                pos += 1;
                continue;
            }

            if bytes[pos] == b'(' {
                let end = comment_end(bytes, pos);
                let parent = match last_product {
                    // A product takes at most one directly following comment block.
                    Some((product, false)) => {
                        last_product = Some((product, true));
                        product
                    }
                    _ => root,
                };
                add_comments(&mut builder, parent, pos..end);
                pos = end;
                continue;
            }

            let start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'(' {
                pos += 1;
            }
            let product = builder.add_child(root, "product", start..pos);
            if let Some((name, version)) = input.get(start..pos).and_then(product_parts) {
                builder.add_child(product, "name", shift(name, start));
                if let Some(version) = version {
                    builder.add_child(product, "version", shift(version, start));
                }
            }
            last_product = Some((product, false));
        }

        let mut tree = builder.finish();
        extend_product_spans(&mut tree);
        tree
    }
}

fn shift(range: Range<usize>, by: usize) -> Range<usize> {
    range.start + by..range.end + by
}

/// Byte offset just past the `)` closing the block opened at `open`, or the end
/// of input for an unterminated block.
fn comment_end(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    for (offset, b) in bytes[open..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return open + offset + 1;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}

fn add_comments(builder: &mut TreeBuilder, parent: NodeId, span: Range<usize>) {
    let comments = builder.add_child(parent, "comments", span.clone());
    let input = builder.input().to_string();
    let bytes = input.as_bytes();

    // Inner text without the surrounding parentheses.
    let inner_start = span.start + 1;
    let inner_end = if span.end > inner_start && bytes[span.end - 1] == b')' { span.end - 1 } else { span.end };

    let mut entry_start = inner_start;
    let mut depth = 0usize;
    for i in inner_start..=inner_end {
        let at_end = i == inner_end;
        if !at_end {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if at_end || (bytes[i] == b';' && depth == 0) {
            if let Some(entry) = trimmed(bytes, entry_start..i) {
                let node = builder.add_child(comments, "entry", entry.clone());
                add_words(builder, node, bytes, entry);
            }
            entry_start = i + 1;
        }
    }
}

fn add_words(builder: &mut TreeBuilder, entry: NodeId, bytes: &[u8], span: Range<usize>) {
    let mut pos = span.start;
    while pos < span.end {
        if bytes[pos].is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < span.end && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        builder.add_child(entry, "word", start..pos);
    }
}

fn trimmed(bytes: &[u8], mut span: Range<usize>) -> Option<Range<usize>> {
    while span.start < span.end && bytes[span.start].is_ascii_whitespace() {
        span.start += 1;
    }
    while span.end > span.start && bytes[span.end - 1].is_ascii_whitespace() {
        span.end -= 1;
    }
    (span.start < span.end).then_some(span)
}

/// Stretch each product span so it also covers its attached comment block.
fn extend_product_spans(tree: &mut SyntaxTree) {
    for idx in 0..tree.nodes.len() {
        if tree.nodes[idx].label != "product" {
            continue;
        }
        let end = tree.nodes[idx].children.iter().map(|c| tree.nodes[c.0].span.end).max();
        if let Some(end) = end {
            if end > tree.nodes[idx].span.end {
                tree.nodes[idx].span.end = end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_of_children(tree: &SyntaxTree, node: NodeId) -> Vec<(String, String)> {
        tree.children(node).iter().map(|&c| (tree.label(c).to_string(), tree.text(c).to_string())).collect()
    }

    #[test]
    fn single_product() {
        let tree = ProductTreeParser.parse("SomeBrowser/3.1415926");
        let root = tree.root();
        assert_eq!(tree.label(root), "agent");
        let product = tree.children(root)[0];
        assert_eq!(
            labels_of_children(&tree, product),
            vec![("name".into(), "SomeBrowser".into()), ("version".into(), "3.1415926".into())]
        );
    }

    #[test]
    fn comment_attaches_to_preceding_product() {
        let tree = ProductTreeParser.parse("Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0");
        let root = tree.root();
        let products = tree.children(root);
        assert_eq!(products.len(), 2);
        assert_eq!(tree.text(products[0]), "Mozilla/5.0 (X11; Linux x86_64)");
        assert_eq!(tree.text(products[1]), "Firefox/120.0");

        let comments = tree.children(products[0])[2];
        assert_eq!(tree.label(comments), "comments");
        assert_eq!(
            labels_of_children(&tree, comments),
            vec![("entry".into(), "X11".into()), ("entry".into(), "Linux x86_64".into())]
        );
        let linux = tree.children(comments)[1];
        assert_eq!(
            labels_of_children(&tree, linux),
            vec![("word".into(), "Linux".into()), ("word".into(), "x86_64".into())]
        );
    }

    #[test]
    fn leading_and_unterminated_comments() {
        let tree = ProductTreeParser.parse("(compatible; Bot) Agent (open; ended");
        let root = tree.root();
        let children = labels_of_children(&tree, root);
        assert_eq!(children[0], ("comments".to_string(), "(compatible; Bot)".to_string()));
        assert_eq!(children[1].0, "product");
        let agent = tree.children(root)[1];
        let comments = tree.children(agent)[1];
        assert_eq!(tree.text(comments), "(open; ended");
        assert_eq!(tree.children(comments).len(), 2);
    }

    #[test]
    fn empty_input_has_only_a_root() {
        let tree = ProductTreeParser.parse("   ");
        assert_eq!(tree.len(), 1);
        assert!(tree.children(tree.root()).is_empty());
    }
}
