//! Environment resolution.
//!
//! An environment is opened by a `\begin` command and closed by an `\end` command with the
//!     same name in the same group.
//! Closing an environment splices everything between the two commands into an
//!     [Environment](crate::tree::Value::Environment) node, or a
//!     [MathEnvironment](crate::tree::Value::MathEnvironment) node for math-mode environments.
//!
//! The bodies of raw environments, like `verbatim`, are not tokenized at all.

use crate::tree::{NodeId, NodeKind, Tree, Value};

/// Environments whose bodies are captured verbatim by default.
pub const DEFAULT_RAW_ENVIRONMENTS: [&str; 4] = ["verbatim", "verbatim*", "lstlisting", "comment"];

/// Environments typeset in math mode by default.
/// The starred variants are included.
pub const DEFAULT_MATH_ENVIRONMENTS: [&str; 38] = [
    "align",
    "align*",
    "alignat",
    "alignat*",
    "aligned",
    "alignedat",
    "array",
    "Bmatrix",
    "bmatrix",
    "cases",
    "cases*",
    "dcases",
    "dcases*",
    "displaymath",
    "eqnarray",
    "eqnarray*",
    "equation",
    "equation*",
    "flalign",
    "flalign*",
    "gather",
    "gather*",
    "gathered",
    "math",
    "matrix",
    "multline",
    "multline*",
    "pmatrix",
    "rcases",
    "rcases*",
    "smallmatrix",
    "split",
    "subarray",
    "Vmatrix",
    "vmatrix",
    "xalignat",
    "xalignat*",
    "xxalignat",
];

pub(crate) const BEGIN: &[u8] = b"\\begin";
pub(crate) const END: &[u8] = b"\\end";

/// Returns the first mandatory argument of a command.
pub(crate) fn first_mandatory_argument(tree: &Tree, command: NodeId) -> Option<NodeId> {
    tree.children(command).iter().copied().find(|child| {
        matches!(
            tree.value(*child),
            Value::Argument {
                optional: false,
                ..
            }
        )
    })
}

/// Returns the number of mandatory arguments of a command.
pub(crate) fn num_mandatory_arguments(tree: &Tree, command: NodeId) -> usize {
    tree.children(command)
        .iter()
        .filter(|child| {
            matches!(
                tree.value(**child),
                Value::Argument {
                    optional: false,
                    ..
                }
            )
        })
        .count()
}

/// Returns the environment name given to a `\begin` or `\end` command.
///
/// Surrounding whitespace is ignored, so `\begin{ center }` opens `center`.
pub(crate) fn name(tree: &Tree, command: NodeId) -> Option<String> {
    let argument = first_mandatory_argument(tree, command)?;
    Some(tree.get_text_string(argument).trim().to_string())
}

/// Whether the node is a `\begin` command with an environment name.
pub(crate) fn is_begin(tree: &Tree, node: NodeId) -> bool {
    tree.command_name(node) == Some(BEGIN) && first_mandatory_argument(tree, node).is_some()
}

/// Wraps the children in an environment node.
///
/// The first child must be the `\begin` command and the last the `\end` command.
pub(crate) fn build(tree: &mut Tree, name: String, math: bool, children: Vec<NodeId>) -> NodeId {
    let begin = children[0];
    let end = children[children.len() - 1];
    debug_assert_eq!(tree.kind(begin), NodeKind::Command);
    debug_assert_eq!(tree.kind(end), NodeKind::Command);
    let line = tree.line(begin);
    let value = if math {
        Value::MathEnvironment { name, begin, end }
    } else {
        Value::Environment { name, begin, end }
    };
    tree.push_with_children(value, line, children)
}
