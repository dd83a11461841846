//! The parse tree.
//!
//! All nodes of a tree live in a single arena owned by the [Tree].
//! Nodes refer to their parent and children using [NodeId] indices into that arena,
//!     so the parent back-references carry no ownership.
//!
//! Every node renders as a prefix, then its children in order, then a suffix.
//! For example a mandatory argument has prefix `{` and suffix `}`,
//!     a command has its name as prefix and no suffix,
//!     and an environment has neither because its `\begin` and `\end` commands are its first
//!     and last children.
//! Rendering the root of a freshly parsed tree reproduces the source byte for byte.

use std::borrow::Cow;

pub mod display;
pub mod lookup;

/// Index of a node in a [Tree].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    fn index(&self) -> usize {
        self.0
    }
}

/// The kind of a node, without any of the node's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Root,
    Text,
    Whitespace,
    Comment,
    Command,
    Argument,
    Group,
    Environment,
    MathEnvironment,
    Math,
    Verbatim,
}

/// The variant-specific data of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Root,
    Text(Vec<u8>),
    Whitespace(Vec<u8>),
    /// A comment, including the `%` and the terminating newline if there is one.
    Comment(Vec<u8>),
    /// A command.
    /// The children of a command are its arguments and any whitespace or comments
    ///     between the arguments.
    Command {
        /// Name including the escape character, e.g. `\section`, or the active character.
        name: Vec<u8>,
    },
    Argument {
        optional: bool,
        open: Vec<u8>,
        close: Vec<u8>,
    },
    /// Braces with no argument semantics.
    Group { open: Vec<u8>, close: Vec<u8> },
    /// An environment.
    /// The first child is the `\begin` command and the last child is the `\end` command.
    Environment {
        name: String,
        begin: NodeId,
        end: NodeId,
    },
    /// An environment whose body is typeset in math mode, like `align`.
    MathEnvironment {
        name: String,
        begin: NodeId,
        end: NodeId,
    },
    /// Inline or display math delimited by `$`, `$$`, `\(`...`\)` or `\[`...`\]`.
    Math { open: Vec<u8>, close: Vec<u8> },
    /// The output of `\verb` or `\verb*`.
    Verbatim {
        command: Vec<u8>,
        delimiter: Vec<u8>,
        body: Vec<u8>,
    },
}

impl Value {
    pub fn kind(&self) -> NodeKind {
        match self {
            Value::Root => NodeKind::Root,
            Value::Text(_) => NodeKind::Text,
            Value::Whitespace(_) => NodeKind::Whitespace,
            Value::Comment(_) => NodeKind::Comment,
            Value::Command { .. } => NodeKind::Command,
            Value::Argument { .. } => NodeKind::Argument,
            Value::Group { .. } => NodeKind::Group,
            Value::Environment { .. } => NodeKind::Environment,
            Value::MathEnvironment { .. } => NodeKind::MathEnvironment,
            Value::Math { .. } => NodeKind::Math,
            Value::Verbatim { .. } => NodeKind::Verbatim,
        }
    }
}

/// A node in the parse tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    line: usize,
    value: Value,
}

impl Node {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Line in the source the node starts on, or 0 for nodes not created by the parser.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// A parse tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree containing only a root node.
    pub fn new() -> Tree {
        Tree {
            nodes: vec![Node {
                parent: None,
                children: vec![],
                line: 1,
                value: Value::Root,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the provided ID.
    ///
    /// Panics if the ID did not come from this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn value(&self, id: NodeId) -> &Value {
        &self.node(id).value
    }

    /// Mutable access to the node's data.
    ///
    /// Changing an environment's `begin` or `end` fields does not move any children.
    #[inline]
    pub fn value_mut(&mut self, id: NodeId) -> &mut Value {
        &mut self.nodes[id.index()].value
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    #[inline]
    pub fn line(&self, id: NodeId) -> usize {
        self.node(id).line
    }

    /// Number of nodes in the arena, including detached nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a new detached node to the arena.
    pub(crate) fn push(&mut self, value: Value, line: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: vec![],
            line,
            value,
        });
        id
    }

    /// Adds a new detached node with the provided children.
    pub(crate) fn push_with_children(
        &mut self,
        value: Value,
        line: usize,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.push(value, line);
        for child in children {
            self.append_child(id, child);
        }
        id
    }

    pub fn new_text<B: Into<Vec<u8>>>(&mut self, text: B) -> NodeId {
        self.push(Value::Text(text.into()), 0)
    }

    pub fn new_whitespace<B: Into<Vec<u8>>>(&mut self, whitespace: B) -> NodeId {
        self.push(Value::Whitespace(whitespace.into()), 0)
    }

    /// Creates a new command.
    ///
    /// The name should include the escape character; e.g. `\emph`.
    pub fn new_command<B: Into<Vec<u8>>>(&mut self, name: B) -> NodeId {
        self.push(Value::Command { name: name.into() }, 0)
    }

    /// Creates a new empty argument delimited by `[]` or `{}`.
    pub fn new_argument(&mut self, optional: bool) -> NodeId {
        let (open, close) = if optional { (b"[", b"]") } else { (b"{", b"}") };
        self.push(
            Value::Argument {
                optional,
                open: open.to_vec(),
                close: close.to_vec(),
            },
            0,
        )
    }

    /// Creates a new empty group delimited by `{}`.
    pub fn new_group(&mut self) -> NodeId {
        self.push(
            Value::Group {
                open: b"{".to_vec(),
                close: b"}".to_vec(),
            },
            0,
        )
    }

    /// Copies a subtree of another tree into this tree.
    ///
    /// Returns the ID of the detached copy.
    /// A root imported this way becomes a group with empty delimiters.
    pub fn import(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let mut value = other.value(id).clone();
        let children: Vec<NodeId> = other
            .children(id)
            .iter()
            .map(|child| self.import(other, *child))
            .collect();
        if let Value::Environment { begin, end, .. } | Value::MathEnvironment { begin, end, .. } =
            &mut value
        {
            let position = |target: NodeId| other.children(id).iter().position(|c| *c == target);
            if let (Some(b), Some(e)) = (position(*begin), position(*end)) {
                *begin = children[b];
                *end = children[e];
            }
        }
        if value == Value::Root {
            value = Value::Group {
                open: vec![],
                close: vec![],
            };
        }
        self.push_with_children(value, other.line(id), children)
    }

    fn resolve_index(&self, parent: NodeId, index: isize, allow_end: bool) -> Option<usize> {
        let len = self.children(parent).len() as isize;
        let i = if index < 0 { len + index } else { index };
        let max = if allow_end { len } else { len - 1 };
        if i < 0 || i > max {
            None
        } else {
            Some(i as usize)
        }
    }

    /// Returns the child at the provided index.
    ///
    /// Negative indices count from the end, so -1 is the last child.
    pub fn child(&self, parent: NodeId, index: isize) -> Option<NodeId> {
        let i = self.resolve_index(parent, index, false)?;
        Some(self.children(parent)[i])
    }

    /// Inserts a child at the provided index.
    ///
    /// Negative indices count from the end, so -1 inserts before the last child.
    /// If the child is attached elsewhere it is first detached.
    /// Returns false if the index is out of range.
    ///
    /// Panics if the child is the parent or one of its ancestors.
    pub fn insert_child(&mut self, parent: NodeId, index: isize, child: NodeId) -> bool {
        assert!(
            child != parent && !self.ancestors(parent).any(|a| a == child),
            "cannot attach a node beneath itself"
        );
        let mut len = self.children(parent).len() as isize;
        if self.parent(child) == Some(parent) {
            len -= 1;
        }
        let i = if index < 0 { len + index } else { index };
        if i < 0 || i > len {
            return false;
        }
        self.detach(child);
        self.nodes[parent.index()].children.insert(i as usize, child);
        self.nodes[child.index()].parent = Some(parent);
        true
    }

    /// Appends a child.
    ///
    /// Panics if the child is the parent or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
        let len = self.children(parent).len() as isize;
        self.insert_child(parent, len, child);
    }

    /// Prepends a child.
    ///
    /// Panics if the child is the parent or one of its ancestors.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, 0, child);
    }

    /// Removes and returns the child at the provided index.
    ///
    /// Negative indices count from the end.
    /// The removed node stays in the arena, detached, and may be attached again.
    pub fn remove_child(&mut self, parent: NodeId, index: isize) -> Option<NodeId> {
        let i = self.resolve_index(parent, index, false)?;
        let child = self.nodes[parent.index()].children.remove(i);
        self.nodes[child.index()].parent = None;
        Some(child)
    }

    /// Replaces the child at the provided index and returns the replaced child.
    ///
    /// Panics if the new child is the parent or one of its ancestors.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        index: isize,
        new_child: NodeId,
    ) -> Option<NodeId> {
        let i = self.resolve_index(parent, index, false)?;
        let old_child = self.children(parent)[i];
        if old_child == new_child {
            return Some(old_child);
        }
        assert!(
            new_child != parent && !self.ancestors(parent).any(|a| a == new_child),
            "cannot attach a node beneath itself"
        );
        self.detach(new_child);
        let i = self.children(parent).iter().position(|c| *c == old_child)?;
        self.nodes[parent.index()].children[i] = new_child;
        self.nodes[new_child.index()].parent = Some(parent);
        self.nodes[old_child.index()].parent = None;
        Some(old_child)
    }

    /// Replaces a node with another node in its parent's list of children.
    ///
    /// Returns false if the node has no parent.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        let parent = match self.parent(old) {
            None => return false,
            Some(parent) => parent,
        };
        let i = match self.children(parent).iter().position(|c| *c == old) {
            None => return false,
            Some(i) => i,
        };
        self.replace_child(parent, i as isize, new).is_some()
    }

    /// Detaches a node from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    /// Iterates over the ancestors of a node, starting with its parent.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Iterates over a node and all of its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Depth of a node below the root of its tree.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Renders the prefix of a node; i.e., the part before its children.
    pub fn write_prefix(&self, id: NodeId, out: &mut Vec<u8>) {
        match self.value(id) {
            Value::Root
            | Value::Environment { .. }
            | Value::MathEnvironment { .. } => {}
            Value::Text(b) | Value::Whitespace(b) | Value::Comment(b) => out.extend(b),
            Value::Command { name } => out.extend(name),
            Value::Argument { open, .. } | Value::Group { open, .. } | Value::Math { open, .. } => {
                out.extend(open)
            }
            Value::Verbatim {
                command,
                delimiter,
                body,
            } => {
                out.extend(command);
                out.extend(delimiter);
                out.extend(body);
                out.extend(delimiter);
            }
        }
    }

    /// Renders the suffix of a node; i.e., the part after its children.
    pub fn write_suffix(&self, id: NodeId, out: &mut Vec<u8>) {
        match self.value(id) {
            Value::Argument { close, .. } | Value::Group { close, .. } | Value::Math { close, .. } => {
                out.extend(close)
            }
            _ => {}
        }
    }

    /// Renders a node back to LaTeX source.
    pub fn write_latex(&self, id: NodeId, out: &mut Vec<u8>) {
        self.write_prefix(id, out);
        for child in self.children(id) {
            self.write_latex(*child, out);
        }
        self.write_suffix(id, out);
    }

    /// Returns the LaTeX source of a node.
    ///
    /// For the root of a freshly parsed tree this is exactly the source that was parsed.
    pub fn to_latex(&self, id: NodeId) -> Vec<u8> {
        let mut out = vec![];
        self.write_latex(id, &mut out);
        out
    }

    /// Returns the LaTeX source of a node as a string.
    ///
    /// Invalid UTF-8 is replaced with the replacement character.
    pub fn to_latex_string(&self, id: NodeId) -> String {
        String::from_utf8_lossy(&self.to_latex(id)).into_owned()
    }

    /// Returns the content of a node with the node's own markup stripped.
    ///
    /// - Arguments, groups and math: the children without the delimiters.
    /// - Environments: the body without the `\begin` and `\end` commands.
    /// - Commands: the content of the mandatory arguments, concatenated.
    /// - Verbatim: the body without the command and delimiters.
    /// - Comments: the empty string.
    /// - Text, whitespace and the root: the full LaTeX source.
    pub fn get_text(&self, id: NodeId) -> Vec<u8> {
        let mut out = vec![];
        match self.value(id) {
            Value::Comment(_) => {}
            Value::Text(b) | Value::Whitespace(b) => out.extend(b),
            Value::Verbatim { body, .. } => out.extend(body),
            Value::Command { .. } => {
                for argument in self.arguments(id) {
                    if let Value::Argument {
                        optional: false, ..
                    } = self.value(argument)
                    {
                        out.extend(self.get_text(argument));
                    }
                }
            }
            Value::Environment { .. } | Value::MathEnvironment { .. } => {
                for child in self.environment_body(id) {
                    self.write_latex(*child, &mut out);
                }
            }
            Value::Root | Value::Argument { .. } | Value::Group { .. } | Value::Math { .. } => {
                for child in self.children(id) {
                    self.write_latex(*child, &mut out);
                }
            }
        }
        out
    }

    /// Same as [Tree::get_text], but returns a string.
    pub fn get_text_string(&self, id: NodeId) -> String {
        String::from_utf8_lossy(&self.get_text(id)).into_owned()
    }

    /// Appends bytes to a text, whitespace, comment or verbatim node.
    ///
    /// Returns false if the node is of a different kind.
    pub fn append_text(&mut self, id: NodeId, text: &[u8]) -> bool {
        match self.value_mut(id) {
            Value::Text(b) | Value::Whitespace(b) | Value::Comment(b) => b.extend(text),
            Value::Verbatim { body, .. } => body.extend(text),
            _ => return false,
        }
        true
    }

    /// Prepends bytes to a text, whitespace, comment or verbatim node.
    ///
    /// Returns false if the node is of a different kind.
    pub fn prepend_text(&mut self, id: NodeId, text: &[u8]) -> bool {
        match self.value_mut(id) {
            Value::Text(b) | Value::Whitespace(b) | Value::Comment(b) => {
                b.splice(0..0, text.iter().copied());
            }
            Value::Verbatim { body, .. } => {
                body.splice(0..0, text.iter().copied());
            }
            _ => return false,
        }
        true
    }

    /// Returns the name of a command, if the node is a command.
    pub fn command_name(&self, id: NodeId) -> Option<&[u8]> {
        match self.value(id) {
            Value::Command { name } => Some(name),
            _ => None,
        }
    }

    /// Returns the argument children of a command.
    pub fn arguments(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.kind(*child) == NodeKind::Argument)
            .collect()
    }

    /// Returns the name of an environment, if the node is an environment.
    pub fn environment_name(&self, id: NodeId) -> Option<&str> {
        match self.value(id) {
            Value::Environment { name, .. } | Value::MathEnvironment { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the children of an environment between its `\begin` and `\end` commands.
    ///
    /// For other kinds of nodes this returns all of the children.
    pub fn environment_body(&self, id: NodeId) -> &[NodeId] {
        let children = self.children(id);
        match self.value(id) {
            Value::Environment { begin, end, .. } | Value::MathEnvironment { begin, end, .. } => {
                let mut body = children;
                if body.first() == Some(begin) {
                    body = &body[1..];
                }
                if body.last() == Some(end) {
                    body = &body[..body.len() - 1];
                }
                body
            }
            _ => children,
        }
    }

    /// Returns the data of a text-like node as a string.
    pub fn content(&self, id: NodeId) -> Option<Cow<'_, str>> {
        match self.value(id) {
            Value::Text(b) | Value::Whitespace(b) | Value::Comment(b) => {
                Some(String::from_utf8_lossy(b))
            }
            Value::Verbatim { body, .. } => Some(String::from_utf8_lossy(body)),
            _ => None,
        }
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}
