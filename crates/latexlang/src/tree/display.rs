//! Debug listing of a tree.
//!
//! Each node is printed on its own line, indented by its depth, e.g.
//!
//! ```text
//! Root
//!   Command \section (line 1)
//!     Argument {} (line 1)
//!       Text "Intro" (line 1)
//! ```

use super::*;

/// Displays a subtree in the debug listing format; see [Tree::dump].
pub struct Dump<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl Tree {
    /// Returns a value that displays the subtree rooted at `id` in the debug listing format.
    pub fn dump(&self, id: NodeId) -> Dump<'_> {
        Dump { tree: self, id }
    }
}

fn lossy(b: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(b)
}

impl<'a> Dump<'a> {
    fn fmt_node(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        id: NodeId,
        depth: usize,
    ) -> std::fmt::Result {
        write!(f, "{}", "  ".repeat(depth))?;
        match self.tree.value(id) {
            Value::Root => write!(f, "Root")?,
            Value::Text(b) => write!(f, "Text {:?}", lossy(b))?,
            Value::Whitespace(b) => write!(f, "Whitespace {:?}", lossy(b))?,
            Value::Comment(b) => write!(f, "Comment {:?}", lossy(b))?,
            Value::Command { name } => write!(f, "Command {}", lossy(name))?,
            Value::Argument {
                optional,
                open,
                close,
            } => write!(
                f,
                "Argument{} {}{}",
                if *optional { " (optional)" } else { "" },
                lossy(open),
                lossy(close)
            )?,
            Value::Group { open, close } => write!(f, "Group {}{}", lossy(open), lossy(close))?,
            Value::Environment { name, .. } => write!(f, "Environment {name}")?,
            Value::MathEnvironment { name, .. } => write!(f, "MathEnvironment {name}")?,
            Value::Math { open, close } => write!(f, "Math {}{}", lossy(open), lossy(close))?,
            Value::Verbatim {
                command,
                delimiter,
                body,
            } => write!(
                f,
                "Verbatim {} {} {:?}",
                lossy(command),
                lossy(delimiter),
                lossy(body)
            )?,
        }
        let line = self.tree.line(id);
        if line > 0 && self.tree.kind(id) != NodeKind::Root {
            write!(f, " (line {line})")?;
        }
        writeln!(f)?;
        for child in self.tree.children(id) {
            self.fmt_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl<'a> std::fmt::Display for Dump<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_node(f, self.id, 0)
    }
}
