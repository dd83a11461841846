//! Finding commands and environments in a tree.

use super::*;

/// Normalizes a command name so that `section` and `\section` both match `\section`.
fn command_name(name: &str) -> Vec<u8> {
    let mut v = Vec::with_capacity(name.len() + 1);
    if !name.starts_with('\\') {
        v.push(b'\\');
    }
    v.extend(name.as_bytes());
    v
}

impl Tree {
    /// Returns all nodes beneath `id`, inclusive, satisfying the predicate, in document order.
    pub fn find_all<F: Fn(&Tree, NodeId) -> bool>(&self, id: NodeId, predicate: F) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|node| predicate(self, *node))
            .collect()
    }

    /// Returns all commands with the provided name beneath `id`, in document order.
    ///
    /// The name may be given with or without the leading backslash.
    /// Active characters like `~` are matched by passing the character itself.
    pub fn find_commands(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let with_escape = command_name(name);
        self.find_all(id, |tree, node| match tree.value(node) {
            Value::Command { name: n } => *n == with_escape || n == name.as_bytes(),
            _ => false,
        })
    }

    /// Returns all environments with the provided name beneath `id`, in document order.
    pub fn find_environments(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.find_all(id, |tree, node| tree.environment_name(node) == Some(name))
    }

    /// Returns the first command with the provided name beneath `id`.
    pub fn find_command(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.find_commands(id, name).into_iter().next()
    }

    /// Returns the first environment with the provided name beneath `id`.
    pub fn find_environment(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.find_environments(id, name).into_iter().next()
    }

    /// Returns the nearest ancestor of `id` of the provided kind.
    pub fn enclosing(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.kind(*a) == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_with_argument(tree: &mut Tree, name: &str, text: &str) -> NodeId {
        let command = tree.new_command(name);
        let argument = tree.new_argument(false);
        let text = tree.new_text(text);
        tree.append_child(argument, text);
        tree.append_child(command, argument);
        command
    }

    #[test]
    fn find_commands_with_and_without_backslash() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = command_with_argument(&mut tree, "\\section", "A");
        let b = command_with_argument(&mut tree, "\\emph", "B");
        let c = command_with_argument(&mut tree, "\\section", "C");
        for node in [a, b, c] {
            tree.append_child(root, node);
        }
        assert_eq!(tree.find_commands(root, "section"), vec![a, c]);
        assert_eq!(tree.find_commands(root, "\\section"), vec![a, c]);
        assert_eq!(tree.find_command(root, "emph"), Some(b));
        assert_eq!(tree.find_command(root, "label"), None);
    }

    #[test]
    fn find_active_character() {
        let mut tree = Tree::new();
        let root = tree.root();
        let tilde = tree.new_command("~");
        tree.append_child(root, tilde);
        assert_eq!(tree.find_commands(root, "~"), vec![tilde]);
    }

    #[test]
    fn enclosing_argument() {
        let mut tree = Tree::new();
        let root = tree.root();
        let command = command_with_argument(&mut tree, "\\emph", "x");
        tree.append_child(root, command);
        let argument = tree.child(command, 0).unwrap();
        let text = tree.child(argument, 0).unwrap();
        assert_eq!(tree.enclosing(text, NodeKind::Command), Some(command));
        assert_eq!(tree.enclosing(text, NodeKind::Math), None);
    }
}
