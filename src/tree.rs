//! Syntax tree arena.
//!
//! The analyzer never parses raw text itself. An external [`TreeParser`] turns
//! the input into a [`SyntaxTree`]: an arena of labeled nodes whose spans point
//! back into the owned input string. Navigation is index based:
//!
//! ```text
//! nodes: [ agent(0) | product(1) | name(2) | version(3) ]
//!
//! agent(0) ── children [1]
//!   product(1) ── parent 0, index 0, children [2, 3]
//!     name(2)    ── parent 1, index 0
//!     version(3) ── parent 1, index 1
//! ```
//!
//! Parents are stored as ids, never as owning references, so the tree has no
//! cycles and every move (up, down, next, previous) is O(1).
//!
//! Every node text is a slice of [`SyntaxTree::input`]. The matcher registry
//! relies on this when it skips matchers whose literal anchors do not occur in
//! the raw input.

#[path = "tree/product_parser.rs"]
mod product_parser;

pub use product_parser::ProductTreeParser;

use std::ops::Range;

/// Stable handle of a node inside one [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    label: String,
    span: Range<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Position among the parent's children.
    index: usize,
}

/// Read-only labeled tree over an input string.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    input: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// The raw input the tree was built from.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The root node (always the first node of the arena).
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has a root, so this is only true for an arena that was
    /// never populated.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn label(&self, node: NodeId) -> &str {
        &self.nodes[node.0].label
    }

    pub fn span(&self, node: NodeId) -> Range<usize> {
        self.nodes[node.0].span.clone()
    }

    /// Raw text covered by `node`.
    pub fn text(&self, node: NodeId) -> &str {
        self.input.get(self.nodes[node.0].span.clone()).unwrap_or("")
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Position of `node` among its parent's children (0 for the root).
    pub fn sibling_index(&self, node: NodeId) -> usize {
        self.nodes[node.0].index
    }

    /// The sibling `offset` positions away from `node` (negative = earlier).
    ///
    /// Returns `None` at the root or when the position falls outside the
    /// parent's children.
    pub fn sibling(&self, node: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let target = self.sibling_index(node).checked_add_signed(offset)?;
        self.children(parent).get(target).copied()
    }

    /// All node ids in creation order (the root first).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }
}

/// Incremental builder used by tree parsers.
///
/// Spans are byte ranges into the input. Out-of-range or non-boundary spans
/// are kept as given and read back as empty text.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    /// Start a tree whose root covers the whole `input`.
    pub fn new(input: impl Into<String>, root_label: &str) -> Self {
        let input = input.into();
        let root = NodeData {
            label: root_label.to_string(),
            span: 0..input.len(),
            parent: None,
            children: Vec::new(),
            index: 0,
        };
        TreeBuilder { tree: SyntaxTree { input, nodes: vec![root] } }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn input(&self) -> &str {
        &self.tree.input
    }

    /// Append a child to `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, label: &str, span: Range<usize>) -> NodeId {
        let id = NodeId(self.tree.nodes.len());
        let index = self.tree.nodes[parent.0].children.len();
        self.tree.nodes.push(NodeData {
            label: label.to_string(),
            span,
            parent: Some(parent),
            children: Vec::new(),
            index,
        });
        self.tree.nodes[parent.0].children.push(id);
        id
    }

    pub fn finish(self) -> SyntaxTree {
        self.tree
    }
}

/// Turns raw input into a [`SyntaxTree`].
///
/// Implementations must be pure: the same input always yields the same tree.
pub trait TreeParser: Send + Sync {
    fn parse(&self, input: &str) -> SyntaxTree;
}

impl<F> TreeParser for F
where
    F: Fn(&str) -> SyntaxTree + Send + Sync,
{
    fn parse(&self, input: &str) -> SyntaxTree {
        self(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxTree {
        let mut b = TreeBuilder::new("Foo/1.0 Bar/2.0", "agent");
        let root = b.root();
        let foo = b.add_child(root, "product", 0..7);
        b.add_child(foo, "name", 0..3);
        b.add_child(foo, "version", 4..7);
        let bar = b.add_child(root, "product", 8..15);
        b.add_child(bar, "name", 8..11);
        b.finish()
    }

    #[test]
    fn navigation_is_index_based() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(tree.text(root), "Foo/1.0 Bar/2.0");
        assert_eq!(tree.parent(root), None);

        let first = tree.children(root)[0];
        let second = tree.children(root)[1];
        assert_eq!(tree.text(first), "Foo/1.0");
        assert_eq!(tree.sibling(first, 1), Some(second));
        assert_eq!(tree.sibling(second, -1), Some(first));
        assert_eq!(tree.sibling(first, -1), None);
        assert_eq!(tree.sibling(second, 1), None);
        assert_eq!(tree.sibling(root, 1), None);

        let version = tree.children(first)[1];
        assert_eq!(tree.label(version), "version");
        assert_eq!(tree.text(version), "1.0");
        assert_eq!(tree.sibling_index(version), 1);
        assert_eq!(tree.parent(version), Some(first));
    }

    #[test]
    fn bad_span_reads_as_empty() {
        let mut b = TreeBuilder::new("abc", "agent");
        let root = b.root();
        let bad = b.add_child(root, "x", 2..10);
        let tree = b.finish();
        assert_eq!(tree.text(bad), "");
        assert_eq!(tree.len(), 2);
    }
}
