//! Searching the rendered source of a tree and mapping matches back to nodes.
//!
//! A [Matcher] renders a subtree once and records the byte range every node renders to.
//! Each match of a regular expression is then resolved to the smallest set of nodes
//!     covering it: the deepest common ancestor of the first and last matched bytes,
//!     and the minimal contiguous run of that ancestor's children spanning both.
//!
//! ```
//! use latexlang::search::Matcher;
//! use regex::bytes::Regex;
//!
//! let tree = latexlang::parse_str(r"Hello \textbf{bold} world").unwrap();
//! let matcher = Matcher::new(&tree);
//! let m = matcher.find(&Regex::new(r"\\textbf\{[a-z]+\}").unwrap()).unwrap();
//! assert_eq!(m.nodes.len(), 1);
//! assert_eq!(tree.command_name(m.nodes[0]), Some(&b"\\textbf"[..]));
//! assert!(m.exact);
//! ```

use crate::tree::{NodeId, Tree};
use regex::bytes::Regex;
use std::collections::HashMap;
use std::ops::Range;

/// A match of a pattern, resolved to nodes of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte offset of the start of the match in the rendered subtree.
    pub start: usize,
    /// Byte offset just after the end of the match.
    pub end: usize,
    pub text: Vec<u8>,
    /// The matched nodes: either consecutive children of [Match::ancestor],
    ///     or the ancestor alone.
    pub nodes: Vec<NodeId>,
    /// The deepest node containing the whole match.
    pub ancestor: NodeId,
    /// Whether the matched nodes render to exactly the matched text.
    pub exact: bool,
}

impl Match {
    /// Whether the match was collapsed to its common ancestor.
    pub fn is_collapsed(&self) -> bool {
        self.nodes == [self.ancestor]
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Searches the rendered source of a subtree.
pub struct Matcher<'t> {
    tree: &'t Tree,
    root: NodeId,
    text: Vec<u8>,
    spans: HashMap<NodeId, Range<usize>>,
}

impl<'t> Matcher<'t> {
    /// Creates a matcher for the whole tree.
    pub fn new(tree: &'t Tree) -> Matcher<'t> {
        Matcher::new_at(tree, tree.root())
    }

    /// Creates a matcher for the subtree rooted at `root`.
    ///
    /// Offsets in matches are relative to the start of the subtree.
    pub fn new_at(tree: &'t Tree, root: NodeId) -> Matcher<'t> {
        let mut matcher = Matcher {
            tree,
            root,
            text: Vec::new(),
            spans: HashMap::new(),
        };
        matcher.render(root);
        matcher
    }

    fn render(&mut self, id: NodeId) {
        let start = self.text.len();
        self.tree.write_prefix(id, &mut self.text);
        for child in self.tree.children(id) {
            self.render(*child);
        }
        self.tree.write_suffix(id, &mut self.text);
        self.spans.insert(id, start..self.text.len());
    }

    /// The rendered source of the subtree.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Byte range the node renders to, or [None] if the node is not in the subtree.
    pub fn span_of(&self, id: NodeId) -> Option<Range<usize>> {
        self.spans.get(&id).cloned()
    }

    /// Returns the first match of the pattern.
    pub fn find(&self, pattern: &Regex) -> Option<Match> {
        let m = pattern.find(&self.text)?;
        Some(self.resolve(m.range()))
    }

    /// Returns all non-overlapping matches of the pattern.
    pub fn find_all(&self, pattern: &Regex) -> Vec<Match> {
        pattern
            .find_iter(&self.text)
            .map(|m| self.resolve(m.range()))
            .collect()
    }

    /// Resolves an arbitrary byte range of the rendered source to nodes.
    ///
    /// The range is clamped to the rendered source.
    pub fn resolve(&self, range: Range<usize>) -> Match {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        let first = self.path_to(start);
        let last = self.path_to(if end > start { end - 1 } else { start });
        let common = first
            .iter()
            .zip(last.iter())
            .take_while(|(a, b)| a == b)
            .count();
        // Paths always start at the root, so they share at least one node.
        let ancestor = first[common - 1];
        let children = self.tree.children(ancestor);
        let nodes = match (first.get(common), last.get(common)) {
            (Some(a), Some(b)) => {
                let i = children.iter().position(|c| c == a).unwrap_or(0);
                let j = children.iter().position(|c| c == b).unwrap_or(i);
                if i == 0 && j + 1 == children.len() {
                    vec![ancestor]
                } else {
                    children[i..=j].to_vec()
                }
            }
            // One endpoint is in the markup of the ancestor itself.
            _ => vec![ancestor],
        };
        let covered = self.covered(&nodes);
        Match {
            start,
            end,
            text: self.text[start..end].to_vec(),
            exact: covered == (start..end),
            nodes,
            ancestor,
        }
    }

    fn covered(&self, nodes: &[NodeId]) -> Range<usize> {
        let start = nodes
            .first()
            .and_then(|n| self.span_of(*n))
            .map(|s| s.start)
            .unwrap_or(0);
        let end = nodes
            .last()
            .and_then(|n| self.span_of(*n))
            .map(|s| s.end)
            .unwrap_or(0);
        start..end
    }

    /// Returns the path from the root to the deepest node whose rendering contains the offset.
    ///
    /// The path stops at a node if the offset falls in the node's own prefix or suffix.
    fn path_to(&self, offset: usize) -> Vec<NodeId> {
        let mut path = vec![self.root];
        let mut node = self.root;
        'descend: loop {
            for child in self.tree.children(node) {
                let span = match self.spans.get(child) {
                    None => continue,
                    Some(span) => span,
                };
                if span.contains(&offset) {
                    path.push(*child);
                    node = *child;
                    continue 'descend;
                }
            }
            return path;
        }
    }

    /// Widens a match to the nearest enclosing construct.
    ///
    /// A match of several children widens to their parent.
    /// A match that is already a single collapsed node widens to that node's parent.
    /// Returns [None] if the match is already the root of the subtree.
    pub fn parent_match(&self, m: &Match) -> Option<Match> {
        let node = if m.is_collapsed() {
            if m.ancestor == self.root {
                return None;
            }
            self.tree.parent(m.ancestor)?
        } else {
            m.ancestor
        };
        let span = self.span_of(node)?;
        Some(Match {
            start: span.start,
            end: span.end,
            text: self.text[span].to_vec(),
            nodes: vec![node],
            ancestor: node,
            exact: true,
        })
    }
}
