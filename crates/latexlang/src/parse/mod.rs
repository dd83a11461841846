//! The LaTeX parser.
//!
//! The parser is a shift-reduce parser driven by the lexer.
//! It keeps two stacks:
//!
//! - The main stack holds opening tokens that have not been closed yet and nodes that have
//!     been built but not yet attached to a parent.
//!
//! - The toggle stack holds one entry for each opening token on the main stack,
//!     recording the kind of the delimiter and its position on the main stack.
//!
//! When a closing token matching the top of the toggle stack arrives, everything above the
//!     opening token is spliced off the main stack and becomes the children of a new node.
//! The new node is an argument if it directly follows a command, a math node for math
//!     delimiters, and a group otherwise.
//!
//! Brackets are contextual.
//! A `[` only opens an optional argument if it directly follows a command,
//!     and a `]` only closes one if the top of the toggle stack is a bracket.
//! Otherwise they are literal text, because brackets are common in prose:
//! ```tex
//! The interval is [0, 1].
//! ```
//!
//! Each token is inspected by the category code interpreter before it is parsed,
//!     so assignments like `` \catcode`\@=11 `` affect the very next token.

use crate::error::{Error, Kind as ErrorKind};
use crate::token::lexer::Lexer;
use crate::token::{CatCodeTable, Encoding, Kind, Token};
use crate::tree::{NodeId, NodeKind, Tree, Value};
use std::collections::HashSet;

pub mod catcode;
pub mod environment;
mod number;

/// Options that control parsing.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Encoding at the start of the input.
    /// This may be changed by the input itself using the `inputenc` package.
    pub encoding: Encoding,
    /// Environments whose bodies are captured verbatim.
    pub raw_environments: HashSet<String>,
    /// Environments that produce [Value::MathEnvironment] nodes.
    pub math_environments: HashSet<String>,
    /// Whether errors carry the tree built before the error occurred.
    pub keep_partial_tree: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            encoding: Default::default(),
            raw_environments: environment::DEFAULT_RAW_ENVIRONMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            math_environments: environment::DEFAULT_MATH_ENVIRONMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keep_partial_tree: true,
        }
    }
}

impl ParserOptions {
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_raw_environment<S: Into<String>>(mut self, name: S) -> Self {
        self.raw_environments.insert(name.into());
        self
    }

    pub fn with_math_environment<S: Into<String>>(mut self, name: S) -> Self {
        self.math_environments.insert(name.into());
        self
    }

    pub fn with_keep_partial_tree(mut self, keep_partial_tree: bool) -> Self {
        self.keep_partial_tree = keep_partial_tree;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Brace,
    Bracket,
    Dollar,
    DoubleDollar,
    Paren,
    Square,
}

impl Delimiter {
    fn is_math(&self) -> bool {
        matches!(
            self,
            Delimiter::Dollar | Delimiter::DoubleDollar | Delimiter::Paren | Delimiter::Square
        )
    }
}

#[derive(Debug)]
enum Entry {
    Opener(Token),
    Node(NodeId),
}

#[derive(Debug, Clone, Copy)]
struct Toggle {
    delimiter: Delimiter,
    // Index of the opening token on the main stack.
    depth: usize,
}

/// The LaTeX parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    options: ParserOptions,
    interpreter: catcode::Interpreter,
    tree: Tree,
    stack: Vec<Entry>,
    toggles: Vec<Toggle>,
    // An `\end` command whose environment name has not been seen yet.
    pending_end: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a [u8], options: ParserOptions) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(source, options.encoding),
            options,
            interpreter: Default::default(),
            tree: Tree::new(),
            stack: vec![],
            toggles: vec![],
            pending_end: None,
        }
    }

    /// Parses the input.
    ///
    /// After this returns the lexer state, like the category code table, reflects all of the
    ///     assignments in the input that was parsed.
    pub fn parse(&mut self) -> Result<Tree, Error> {
        match self.run() {
            Ok(()) => {
                let mut tree = std::mem::take(&mut self.tree);
                let root = tree.root();
                for entry in std::mem::take(&mut self.stack) {
                    if let Entry::Node(id) = entry {
                        tree.append_child(root, id);
                    }
                }
                Ok(tree)
            }
            Err(err) => {
                log::debug!("parse failed at line {}: {}", err.line, err.title());
                if self.options.keep_partial_tree {
                    Err(err.with_partial_tree(self.take_partial_tree()))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// The category codes in effect at the current position.
    pub fn cat_codes(&self) -> &CatCodeTable {
        self.lexer.cat_codes()
    }

    /// The encoding in effect at the current position.
    pub fn encoding(&self) -> Encoding {
        self.lexer.encoding()
    }

    /// The current line, starting at 1.
    pub fn line(&self) -> usize {
        self.lexer.line()
    }

    fn take_partial_tree(&mut self) -> Tree {
        let mut tree = std::mem::take(&mut self.tree);
        let root = tree.root();
        for entry in std::mem::take(&mut self.stack) {
            let id = match entry {
                Entry::Node(id) => id,
                Entry::Opener(token) => {
                    let bytes = self.lexer.slice(token.span);
                    tree.push(Value::Text(bytes.to_vec()), token.line)
                }
            };
            tree.append_child(root, id);
        }
        self.toggles.clear();
        tree
    }

    fn run(&mut self) -> Result<(), Error> {
        while let Some(token) = self.lexer.next() {
            let token = if self.interpreter.observe(&mut self.lexer, &token)? {
                Token {
                    kind: Kind::Text,
                    ..token
                }
            } else {
                token
            };
            self.process(token)?;
        }
        self.finish()
    }

    fn error(&self, kind: ErrorKind, token: &Token) -> Error {
        Error::new(kind, token.line).with_span(self.lexer.source(), token.span.clone())
    }

    fn spelling(&self, token: &Token) -> String {
        String::from_utf8_lossy(self.lexer.slice(token.span.clone())).into_owned()
    }

    fn process(&mut self, token: Token) -> Result<(), Error> {
        if !token.is_insignificant() {
            if let Some(end) = self.pending_end.take() {
                if token.kind != Kind::GroupOpen {
                    return Err(self.error(ErrorKind::MissingEnvironmentName, &end));
                }
            }
        }
        log::trace!(
            "line {}: {:?} {:?}",
            token.line,
            token.kind,
            self.spelling(&token)
        );
        match token.kind {
            Kind::Whitespace => self.push_text_like(&token, NodeKind::Whitespace),
            Kind::Text | Kind::AlignTab => self.push_text_like(&token, NodeKind::Text),
            Kind::Comment => {
                let bytes = self.lexer.slice(token.span.clone()).to_vec();
                let id = self.tree.push(Value::Comment(bytes), token.line);
                self.stack.push(Entry::Node(id));
            }
            Kind::GroupOpen => self.open(Delimiter::Brace, token),
            Kind::GroupClose => self.close(Delimiter::Brace, token)?,
            Kind::MathToggle => self.math_toggle(token)?,
            Kind::OptOpen => {
                if self.follows_command() {
                    self.open(Delimiter::Bracket, token);
                } else {
                    self.push_text_like(&token, NodeKind::Text);
                }
            }
            Kind::OptClose => {
                if matches!(self.toggles.last(), Some(t) if t.delimiter == Delimiter::Bracket) {
                    self.close(Delimiter::Bracket, token)?;
                } else {
                    self.push_text_like(&token, NodeKind::Text);
                }
            }
            Kind::Command => match self.lexer.slice(token.span.clone()) {
                b"\\(" => self.open(Delimiter::Paren, token),
                b"\\[" => self.open(Delimiter::Square, token),
                b"\\)" => self.close(Delimiter::Paren, token)?,
                b"\\]" => self.close(Delimiter::Square, token)?,
                b"\\verb" => self.verbatim(token)?,
                name => {
                    if name == environment::END {
                        self.pending_end = Some(token.clone());
                    }
                    let id = self.tree.push(
                        Value::Command {
                            name: name.to_vec(),
                        },
                        token.line,
                    );
                    self.stack.push(Entry::Node(id));
                }
            },
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if let Some(end) = self.pending_end.take() {
            return Err(self.error(ErrorKind::MissingEnvironmentName, &end));
        }
        self.demote_brackets(0);
        if let Some(toggle) = self.toggles.last().copied() {
            let token = match &self.stack[toggle.depth] {
                Entry::Opener(token) => token.clone(),
                Entry::Node(_) => unreachable!("toggles always point at opening tokens"),
            };
            let opener = self.spelling(&token);
            return Err(self.error(ErrorKind::UnclosedDelimiter { opener }, &token));
        }
        for entry in self.stack.iter().rev() {
            if let Entry::Node(id) = entry {
                if environment::is_begin(&self.tree, *id) {
                    let name = environment::name(&self.tree, *id).unwrap_or_default();
                    return Err(Error::new(
                        ErrorKind::UnclosedEnvironment { name },
                        self.tree.line(*id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Pushes text or whitespace, merging it into a text or whitespace node on top of the stack.
    fn push_text_like(&mut self, token: &Token, kind: NodeKind) {
        let bytes = self.lexer.slice(token.span.clone());
        if let Some(Entry::Node(top)) = self.stack.last() {
            if merge_text_like(&mut self.tree, *top, bytes, kind) {
                return;
            }
        }
        let value = match kind {
            NodeKind::Whitespace => Value::Whitespace(bytes.to_vec()),
            _ => Value::Text(bytes.to_vec()),
        };
        let id = self.tree.push(value, token.line);
        self.stack.push(Entry::Node(id));
    }

    /// Whether the last significant entry on the main stack is a command.
    fn follows_command(&self) -> bool {
        for entry in self.stack.iter().rev() {
            match entry {
                Entry::Opener(_) => return false,
                Entry::Node(id) => match self.tree.kind(*id) {
                    NodeKind::Whitespace | NodeKind::Comment => continue,
                    NodeKind::Command => return true,
                    _ => return false,
                },
            }
        }
        false
    }

    fn open(&mut self, delimiter: Delimiter, token: Token) {
        log::trace!("shift {:?} at depth {}", delimiter, self.stack.len());
        self.toggles.push(Toggle {
            delimiter,
            depth: self.stack.len(),
        });
        self.stack.push(Entry::Opener(token));
    }

    fn math_toggle(&mut self, token: Token) -> Result<(), Error> {
        let bytes = self.lexer.slice(token.span.clone());
        let first_len = self.lexer.encoding().char_len(bytes);
        if first_len == bytes.len() {
            return if self.can_close(Delimiter::Dollar) {
                self.close(Delimiter::Dollar, token)
            } else {
                self.open(Delimiter::Dollar, token);
                Ok(())
            };
        }
        if self.can_close(Delimiter::DoubleDollar) {
            return self.close(Delimiter::DoubleDollar, token);
        }
        if self.can_close(Delimiter::Dollar) {
            // In `$a$$b$` the middle `$$` closes one inline formula and opens another.
            let split = token.span.start + first_len;
            let closer = Token {
                kind: Kind::MathToggle,
                span: token.span.start..split,
                line: token.line,
            };
            let opener = Token {
                kind: Kind::MathToggle,
                span: split..token.span.end,
                line: token.line,
            };
            self.close(Delimiter::Dollar, closer)?;
            self.open(Delimiter::Dollar, opener);
            return Ok(());
        }
        self.open(Delimiter::DoubleDollar, token);
        Ok(())
    }

    /// Whether a closer of this kind would match, possibly after demoting open brackets.
    fn can_close(&self, delimiter: Delimiter) -> bool {
        for toggle in self.toggles.iter().rev() {
            if toggle.delimiter == delimiter {
                return true;
            }
            if toggle.delimiter != Delimiter::Bracket {
                return false;
            }
        }
        false
    }

    /// Demotes brackets on top of the toggle stack above the provided toggle depth to text.
    fn demote_brackets(&mut self, min_toggles: usize) {
        let mut lowest = None;
        while self.toggles.len() > min_toggles {
            match self.toggles.last() {
                Some(t) if t.delimiter == Delimiter::Bracket => {}
                _ => break,
            }
            let toggle = match self.toggles.pop() {
                Some(toggle) => toggle,
                None => break,
            };
            if let Entry::Opener(token) = &self.stack[toggle.depth] {
                log::trace!("demoting `[` at line {} to text", token.line);
                let bytes = self.lexer.slice(token.span.clone()).to_vec();
                let id = self.tree.push(Value::Text(bytes), token.line);
                self.stack[toggle.depth] = Entry::Node(id);
            }
            lowest = Some(toggle.depth);
        }
        if let Some(lowest) = lowest {
            self.coalesce_from(lowest.saturating_sub(1));
        }
    }

    /// Merges adjacent text and whitespace nodes on the main stack at or above `start`.
    fn coalesce_from(&mut self, start: usize) {
        let tail = self.stack.split_off(start);
        for entry in tail {
            if let (Entry::Node(id), Some(Entry::Node(top))) = (&entry, self.stack.last()) {
                let kind = self.tree.kind(*id);
                if matches!(kind, NodeKind::Text | NodeKind::Whitespace) {
                    let bytes = self.tree.to_latex(*id);
                    if merge_text_like(&mut self.tree, *top, &bytes, kind) {
                        continue;
                    }
                }
            }
            self.stack.push(entry);
        }
    }

    fn close(&mut self, delimiter: Delimiter, token: Token) -> Result<(), Error> {
        if !self.can_close(delimiter) {
            let closer = self.spelling(&token);
            return Err(self.error(ErrorKind::UnmatchedCloser { closer }, &token));
        }
        let matching = self
            .toggles
            .iter()
            .rposition(|t| t.delimiter == delimiter)
            .unwrap_or(0);
        self.demote_brackets(matching + 1);
        let toggle = match self.toggles.pop() {
            Some(toggle) => toggle,
            None => unreachable!("can_close checked that a toggle matches"),
        };
        let children: Vec<NodeId> = self
            .stack
            .split_off(toggle.depth + 1)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Node(id) => Some(id),
                Entry::Opener(_) => None,
            })
            .collect();
        let opener = match self.stack.pop() {
            Some(Entry::Opener(opener)) => opener,
            _ => unreachable!("toggles always point at opening tokens"),
        };
        log::trace!(
            "reduce {:?} with {} children at depth {}",
            delimiter,
            children.len(),
            toggle.depth
        );
        let open = self.lexer.slice(opener.span.clone()).to_vec();
        let close = self.lexer.slice(token.span.clone()).to_vec();
        if delimiter.is_math() {
            let id = self
                .tree
                .push_with_children(Value::Math { open, close }, opener.line, children);
            self.stack.push(Entry::Node(id));
            return Ok(());
        }
        let command = self.preceding_command();
        match command {
            Some(command) => {
                let optional = delimiter == Delimiter::Bracket;
                let id = self.tree.push_with_children(
                    Value::Argument {
                        optional,
                        open,
                        close,
                    },
                    opener.line,
                    children,
                );
                // Whitespace and comments between the command and the argument belong to the command.
                let first_insignificant = self.stack.len() - self.num_insignificant_on_top();
                let between = self.stack.split_off(first_insignificant);
                for entry in between {
                    if let Entry::Node(node) = entry {
                        self.tree.append_child(command, node);
                    }
                }
                self.tree.append_child(command, id);
                if !optional && environment::num_mandatory_arguments(&self.tree, command) == 1 {
                    self.first_argument_closed(command)?;
                }
            }
            None => {
                let id = self
                    .tree
                    .push_with_children(Value::Group { open, close }, opener.line, children);
                self.stack.push(Entry::Node(id));
            }
        }
        Ok(())
    }

    fn num_insignificant_on_top(&self) -> usize {
        self.stack
            .iter()
            .rev()
            .take_while(|entry| {
                matches!(entry, Entry::Node(id)
                    if matches!(self.tree.kind(*id), NodeKind::Whitespace | NodeKind::Comment))
            })
            .count()
    }

    /// Returns the command that a group closed now would be an argument of.
    fn preceding_command(&self) -> Option<NodeId> {
        let n = self.num_insignificant_on_top();
        match self.stack.get(self.stack.len().checked_sub(n + 1)?) {
            Some(Entry::Node(id)) if self.tree.kind(*id) == NodeKind::Command => Some(*id),
            _ => None,
        }
    }

    /// Handles the first mandatory argument of `\begin`, `\end` and `\usepackage`.
    fn first_argument_closed(&mut self, command: NodeId) -> Result<(), Error> {
        let name = match self.tree.command_name(command) {
            Some(name) => name.to_vec(),
            None => return Ok(()),
        };
        if name == environment::BEGIN {
            let env_name = environment::name(&self.tree, command).unwrap_or_default();
            if self.options.raw_environments.contains(&env_name) {
                self.raw_environment(command, env_name)?;
            }
        } else if name == environment::END {
            self.end_environment(command)?;
        } else if name == b"\\usepackage" {
            self.use_package(command)?;
        }
        Ok(())
    }

    fn raw_environment(&mut self, begin: NodeId, name: String) -> Result<(), Error> {
        let delimiter = format!["\\end{{{name}}}"];
        let body_line = self.lexer.line();
        let (body, end) = match self.lexer.read_until(delimiter.as_bytes()) {
            None => {
                return Err(Error::new(
                    ErrorKind::UnterminatedRawEnvironment { name },
                    self.tree.line(begin),
                ))
            }
            Some(ranges) => ranges,
        };
        log::debug!(
            "line {}: captured {} bytes of the raw environment `{name}`",
            body_line,
            body.len()
        );
        let end_line = self.lexer.line();
        let mut children = vec![begin];
        if !body.is_empty() {
            let bytes = self.lexer.slice(body).to_vec();
            children.push(self.tree.push(Value::Text(bytes), body_line));
        }
        let end_command = self.tree.push(
            Value::Command {
                name: environment::END.to_vec(),
            },
            end_line,
        );
        let argument = self.tree.push(
            Value::Argument {
                optional: false,
                open: b"{".to_vec(),
                close: b"}".to_vec(),
            },
            end_line,
        );
        // The delimiter is `\end{name}`, so the name sits between the braces.
        let name_span = end.start + environment::END.len() + 1..end.end - 1;
        let name_text = self
            .tree
            .push(Value::Text(self.lexer.slice(name_span).to_vec()), end_line);
        self.tree.append_child(argument, name_text);
        self.tree.append_child(end_command, argument);
        children.push(end_command);
        // The `\begin` command is on top of the stack.
        self.stack.pop();
        let math = self.options.math_environments.contains(&name);
        let id = environment::build(&mut self.tree, name, math, children);
        self.stack.push(Entry::Node(id));
        Ok(())
    }

    fn end_environment(&mut self, end: NodeId) -> Result<(), Error> {
        let name = environment::name(&self.tree, end).unwrap_or_default();
        let mut begin_index = self.find_begin(&name);
        if begin_index.is_none() {
            // Brackets opened inside the environment and never closed, as in `[0,1)`, are text.
            let open_brackets = self
                .toggles
                .iter()
                .rev()
                .take_while(|t| t.delimiter == Delimiter::Bracket)
                .count();
            if open_brackets > 0 {
                self.demote_brackets(self.toggles.len() - open_brackets);
                begin_index = self.find_begin(&name);
            }
        }
        let begin_index = match begin_index {
            None => {
                let err = Error::new(ErrorKind::NoMatchingBegin { name }, self.tree.line(end));
                return Err(match self.end_span(end) {
                    None => err,
                    Some(span) => err.with_span(self.lexer.source(), span),
                });
            }
            Some(i) => i,
        };
        let children: Vec<NodeId> = self
            .stack
            .split_off(begin_index)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Node(id) => Some(id),
                Entry::Opener(_) => None,
            })
            .collect();
        log::debug!(
            "line {}: environment `{name}` spans {} nodes",
            self.tree.line(children[0]),
            children.len()
        );
        let math = self.options.math_environments.contains(&name);
        let id = environment::build(&mut self.tree, name, math, children);
        self.stack.push(Entry::Node(id));
        Ok(())
    }

    /// Index on the main stack of the innermost `\begin{name}` in the current delimiter scope.
    fn find_begin(&self, name: &str) -> Option<usize> {
        let boundary = self.toggles.last().map(|t| t.depth + 1).unwrap_or(0);
        // The `\end` command is on top of the stack.
        let top = self.stack.len() - 1;
        (boundary..top).rev().find(|i| match self.stack[*i] {
            Entry::Node(id) => {
                environment::is_begin(&self.tree, id)
                    && environment::name(&self.tree, id).as_deref() == Some(name)
            }
            Entry::Opener(_) => false,
        })
    }

    /// Byte range of the `\end{name}` command just parsed, which ends at the current position.
    fn end_span(&self, end: NodeId) -> Option<std::ops::Range<usize>> {
        let len = self.tree.to_latex(end).len();
        let stop = self.lexer.position();
        Some(stop.checked_sub(len)?..stop)
    }

    fn use_package(&mut self, command: NodeId) -> Result<(), Error> {
        let packages = match environment::first_mandatory_argument(&self.tree, command) {
            Some(argument) => self.tree.get_text_string(argument),
            None => return Ok(()),
        };
        if !packages.split(',').any(|p| p.trim() == "inputenc") {
            return Ok(());
        }
        let option = self.tree.children(command).iter().find_map(|child| {
            match self.tree.value(*child) {
                Value::Argument { optional: true, .. } => Some(self.tree.get_text_string(*child)),
                _ => None,
            }
        });
        let option = match option {
            None => return Ok(()),
            Some(option) => option,
        };
        let name = option
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .last()
            .unwrap_or_default()
            .to_string();
        match crate::token::Encoding::from_inputenc_option(&name) {
            None => Err(Error::new(
                ErrorKind::UnsupportedEncoding { name },
                self.tree.line(command),
            )),
            Some(encoding) => {
                log::debug!(
                    "line {}: switching input encoding to {encoding}",
                    self.tree.line(command)
                );
                self.lexer.set_encoding(encoding);
                Ok(())
            }
        }
    }

    fn verbatim(&mut self, token: Token) -> Result<(), Error> {
        let mut command = self.lexer.slice(token.span.clone()).to_vec();
        if self.lexer.peek_char() == Some(b"*") {
            self.lexer.read_char();
            command.push(b'*');
        }
        let unterminated = || Error::new(ErrorKind::UnterminatedVerb, token.line);
        let delimiter = match self.lexer.read_char() {
            None => return Err(unterminated().with_span(self.lexer.source(), token.span.clone())),
            Some(range) => self.lexer.slice(range).to_vec(),
        };
        let body = match self.lexer.read_until(&delimiter) {
            None => return Err(unterminated().with_span(self.lexer.source(), token.span.clone())),
            Some((body, _)) => self.lexer.slice(body).to_vec(),
        };
        let id = self.tree.push(
            Value::Verbatim {
                command,
                delimiter,
                body,
            },
            token.line,
        );
        self.stack.push(Entry::Node(id));
        Ok(())
    }
}

/// Merges text or whitespace into an existing node if that node is text or whitespace.
///
/// Whitespace followed by text becomes text.
/// Returns false if the existing node is of a different kind.
fn merge_text_like(tree: &mut Tree, existing: NodeId, bytes: &[u8], kind: NodeKind) -> bool {
    let value = tree.value_mut(existing);
    match value {
        Value::Text(b) => b.extend(bytes),
        Value::Whitespace(b) => {
            b.extend(bytes);
            if kind == NodeKind::Text {
                *value = Value::Text(std::mem::take(b));
            }
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::CatCode;

    fn parse(source: &str) -> Tree {
        let mut parser = Parser::new(source.as_bytes(), Default::default());
        parser.parse().unwrap()
    }

    fn parse_err(source: &str) -> Error {
        let mut parser = Parser::new(source.as_bytes(), Default::default());
        parser.parse().err().unwrap()
    }

    fn kinds(tree: &Tree) -> Vec<NodeKind> {
        tree.descendants(tree.root()).map(|id| tree.kind(id)).collect()
    }

    macro_rules! round_trip_tests {
        ( $( ($name: ident, $source: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let source: &str = $source;
                let tree = parse(source);
                assert_eq!(tree.to_latex_string(tree.root()), source);
            }
            )+
        };
    }

    round_trip_tests![
        (round_trip_empty, ""),
        (round_trip_text, "Hello, World"),
        (round_trip_command, r"\section{Intro} text"),
        (round_trip_nested, r"\a{\b{\c[d]{e}}}"),
        (round_trip_environment, "\\begin{itemize}\n\\item A\n\\end{itemize}\n"),
        (round_trip_math, r"Inline \(a+b\) and display \[c+d\]"),
        (round_trip_display_dollars, "$$E=mc^2$$"),
        (round_trip_adjacent_inline_math, "$a$$b$"),
        (round_trip_comment, "a % comment\nb"),
        (round_trip_crlf_comment, "a % comment\r\nb"),
        (round_trip_verb, r"\verb|\x{| and \verb*+y+"),
        (round_trip_prose_brackets, "The interval is [0, 1]."),
        (round_trip_stray_close_bracket, "a ] b"),
        (round_trip_unclosed_bracket, r"\item[ label"),
        (round_trip_bracket_demoted_by_brace, r"{\cmd[ x}"),
        (round_trip_catcode, "\\catcode`\\@ = 11 @asLetter"),
        (round_trip_alignment, r"a & b \\ c & d"),
        (round_trip_active_character, "a~b"),
        (round_trip_raw, "\\begin{verbatim}\n% not a comment\n\\textbf{not bold}\n\\end{verbatim}"),
        (round_trip_unicode, "\\emph{€uro}"),
        (round_trip_lone_escape, "a\\"),
        (round_trip_half_open_interval, r"\begin{equation} x \in [0,1) \end{equation}"),
        (round_trip_left_right_brackets, r"\begin{align} \left[ x \right) \end{align}"),
    ];

    #[test]
    fn brackets_in_prose_are_text() {
        let tree = parse("The interval is [0, 1].");
        assert_eq!(kinds(&tree), vec![NodeKind::Root, NodeKind::Text]);
    }

    #[test]
    fn brackets_after_command_are_optional_argument() {
        let tree = parse(r"\mycmd[Inside Opt] more");
        let command = tree.find_command(tree.root(), "mycmd").unwrap();
        let arguments = tree.arguments(command);
        assert_eq!(arguments.len(), 1);
        assert!(matches!(
            tree.value(arguments[0]),
            Value::Argument { optional: true, .. }
        ));
        assert_eq!(tree.to_latex_string(arguments[0]), "[Inside Opt]");
        let optional_arguments = tree
            .descendants(tree.root())
            .filter(|id| tree.kind(*id) == NodeKind::Argument)
            .count();
        assert_eq!(optional_arguments, 1);
    }

    #[test]
    fn whitespace_between_command_and_argument_belongs_to_command() {
        let tree = parse(r"\section {Intro}");
        let command = tree.child(tree.root(), 0).unwrap();
        assert_eq!(
            tree.children(command)
                .iter()
                .map(|c| tree.kind(*c))
                .collect::<Vec<_>>(),
            vec![NodeKind::Whitespace, NodeKind::Argument]
        );
        assert_eq!(tree.get_text_string(command), "Intro");
    }

    #[test]
    fn group_after_text_is_not_an_argument() {
        let tree = parse(r"\foo a {b}");
        let root = tree.root();
        let kinds: Vec<NodeKind> = tree.children(root).iter().map(|c| tree.kind(*c)).collect();
        assert_eq!(kinds, vec![NodeKind::Command, NodeKind::Text, NodeKind::Group]);
    }

    #[test]
    fn text_and_whitespace_are_coalesced() {
        let tree = parse("a b  c\n d");
        assert_eq!(kinds(&tree), vec![NodeKind::Root, NodeKind::Text]);
    }

    #[test]
    fn leading_whitespace_is_folded_into_text() {
        let tree = parse(r"\x  word");
        let text = tree.child(tree.root(), 1).unwrap();
        assert_eq!(tree.value(text), &Value::Text(b"  word".to_vec()));
    }

    #[test]
    fn whitespace_alone_stays_whitespace() {
        let tree = parse(r"\x  \y");
        let whitespace = tree.child(tree.root(), 1).unwrap();
        assert_eq!(tree.kind(whitespace), NodeKind::Whitespace);
    }

    #[test]
    fn environment_structure() {
        let tree = parse("\\begin{center}\nx\n\\end{center}");
        let root = tree.root();
        let environment = tree.child(root, 0).unwrap();
        assert_eq!(tree.environment_name(environment), Some("center"));
        let children = tree.children(environment);
        assert_eq!(children.len(), 3);
        assert_eq!(tree.command_name(children[0]), Some(&b"\\begin"[..]));
        assert_eq!(tree.command_name(children[2]), Some(&b"\\end"[..]));
        assert_eq!(tree.get_text_string(environment), "\nx\n");
        assert_eq!(tree.line(children[2]), 3);
    }

    #[test]
    fn math_environment() {
        let tree = parse(r"\begin{align*}x\end{align*}");
        let environment = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.kind(environment), NodeKind::MathEnvironment);
    }

    #[test]
    fn open_bracket_inside_environment_is_text() {
        let tree = parse(r"\begin{equation} x \in [0,1) \end{equation}");
        let environment = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.kind(environment), NodeKind::MathEnvironment);
        assert_eq!(tree.environment_name(environment), Some("equation"));
        let command = tree.find_command(environment, "in").unwrap();
        assert!(tree.arguments(command).is_empty());
        assert_eq!(tree.get_text_string(environment), r" x \in [0,1) ");
    }

    #[test]
    fn environment_inside_optional_argument() {
        let tree = parse(r"\item[\begin{x}a\end{x}] b");
        let command = tree.find_command(tree.root(), "item").unwrap();
        let arguments = tree.arguments(command);
        assert_eq!(arguments.len(), 1);
        assert_eq!(tree.to_latex_string(arguments[0]), r"[\begin{x}a\end{x}]");
        assert!(tree.find_environment(arguments[0], "x").is_some());
    }

    #[test]
    fn nested_environments() {
        let tree = parse(r"\begin{a}\begin{b}x\end{b}\end{a}");
        let outer = tree.find_environment(tree.root(), "a").unwrap();
        let inner = tree.find_environment(tree.root(), "b").unwrap();
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn unmatched_begin_inside_environment_is_a_plain_command() {
        let tree = parse(r"\begin{a}\begin{b}x\end{a}");
        assert_eq!(tree.find_environments(tree.root(), "b"), vec![]);
        assert_eq!(tree.find_environments(tree.root(), "a").len(), 1);
    }

    #[test]
    fn raw_environment_body_is_text() {
        let source = "\\begin{verbatim}\n% not a comment\n\\textbf{not bold}\n\\end{verbatim}";
        let tree = parse(source);
        let environment = tree.find_environment(tree.root(), "verbatim").unwrap();
        let body = tree.environment_body(environment);
        assert_eq!(body.len(), 1);
        assert_eq!(tree.kind(body[0]), NodeKind::Text);
        assert_eq!(
            tree.get_text_string(environment),
            "\n% not a comment\n\\textbf{not bold}\n"
        );
        let end = tree.child(environment, -1).unwrap();
        assert_eq!(tree.line(end), 4);
    }

    #[test]
    fn lines_continue_after_raw_environment() {
        let tree = parse("\\begin{comment}\na\nb\n\\end{comment}\n\\x");
        let command = tree.find_command(tree.root(), "x").unwrap();
        assert_eq!(tree.line(command), 5);
    }

    #[test]
    fn custom_raw_environment() {
        let options = ParserOptions::default().with_raw_environment("minted");
        let source = r"\begin{minted}{$}\end{minted}";
        let mut parser = Parser::new(source.as_bytes(), options);
        let tree = parser.parse().unwrap();
        let environment = tree.find_environment(tree.root(), "minted").unwrap();
        assert_eq!(tree.get_text_string(environment), "{$}");
    }

    #[test]
    fn math_delimiters_are_uniform() {
        let tree = parse(r"$a$ $$b$$ \(c\) \[d\]");
        let math: Vec<(String, String)> = tree
            .descendants(tree.root())
            .filter_map(|id| match tree.value(id) {
                Value::Math { open, close } => Some((
                    String::from_utf8_lossy(open).into_owned(),
                    String::from_utf8_lossy(close).into_owned(),
                )),
                _ => None,
            })
            .collect();
        let want: Vec<(String, String)> = [("$", "$"), ("$$", "$$"), ("\\(", "\\)"), ("\\[", "\\]")]
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert_eq!(math, want);
    }

    #[test]
    fn adjacent_inline_math() {
        let tree = parse("$a$$b$");
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);
        for child in tree.children(root) {
            assert_eq!(tree.kind(*child), NodeKind::Math);
            assert_eq!(tree.to_latex(*child).len(), 3);
        }
    }

    #[test]
    fn nested_math() {
        let tree = parse(r"$$\text{$x$}$$");
        let math = tree.child(tree.root(), 0).unwrap();
        let inner = tree.find_all(math, |t, id| t.kind(id) == NodeKind::Math);
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn verbatim_node() {
        let tree = parse(r"\verb*|a b|");
        let node = tree.child(tree.root(), 0).unwrap();
        assert_eq!(
            tree.value(node),
            &Value::Verbatim {
                command: b"\\verb*".to_vec(),
                delimiter: b"|".to_vec(),
                body: b"a b".to_vec(),
            }
        );
    }

    #[test]
    fn verbatim_multi_byte_delimiter() {
        let tree = parse("\\verb€x€");
        let node = tree.child(tree.root(), 0).unwrap();
        assert_eq!(tree.get_text_string(node), "x");
    }

    #[test]
    fn makeatletter_command_names() {
        let tree = parse(r"\makeatletter\foo@bar");
        assert_eq!(tree.find_commands(tree.root(), r"\foo@bar").len(), 1);
    }

    #[test]
    fn catcode_live_effect() {
        let source = "\\catcode`\\@ = 11 @asLetter";
        let mut parser = Parser::new(source.as_bytes(), Default::default());
        let tree = parser.parse().unwrap();
        assert_eq!(tree.to_latex_string(tree.root()), source);
        assert_eq!(parser.cat_codes().get('@' as u32), CatCode::Letter);
    }

    macro_rules! catcode_literal_tests {
        ( $( ($name: ident, $source: expr, $char: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let source: &str = $source;
                let mut parser = Parser::new(source.as_bytes(), Default::default());
                let tree = parser.parse().unwrap();
                assert_eq!(tree.to_latex_string(tree.root()), source);
                assert_eq!(parser.cat_codes().get($char as u32), $want);
            }
            )+
        };
    }

    catcode_literal_tests![
        (catcode_literal_alignment_tab, r"\catcode`&=12 a&b", '&', CatCode::Other),
        (catcode_literal_parameter, r"\catcode`#=11 \a#b", '#', CatCode::Letter),
        (catcode_literal_math_shift, r"\catcode`$=12 costs $5", '$', CatCode::Other),
        (catcode_literal_begin_group, r"\catcode`{=12 {", '{', CatCode::Other),
        (catcode_literal_end_group, r"\catcode`}=12 }", '}', CatCode::Other),
    ];

    #[test]
    fn catcode_literal_math_shift_does_not_open_math() {
        let tree = parse(r"\catcode`$=12 $x");
        assert!(tree
            .descendants(tree.root())
            .all(|id| tree.kind(id) != NodeKind::Math));
        assert_eq!(tree.find_commands(tree.root(), "catcode").len(), 1);
    }

    #[test]
    fn catcode_literal_parameter_makes_command_names() {
        let tree = parse(r"\catcode`#=11 \a#b");
        assert_eq!(tree.find_commands(tree.root(), r"\a#b").len(), 1);
    }

    #[test]
    fn inputenc_switches_encoding() {
        // In UTF-8 the last two bytes are the single character é.
        let source = b"\\usepackage[latin1]{inputenc}\\\xC3\xA9";
        let mut parser = Parser::new(source, Default::default());
        let tree = parser.parse().unwrap();
        assert_eq!(parser.encoding(), Encoding::Latin1);
        assert_eq!(tree.to_latex(tree.root()), source.to_vec());
        let command = tree.child(tree.root(), -2).unwrap();
        assert_eq!(tree.command_name(command), Some(&b"\\\xC3"[..]));
        let text = tree.child(tree.root(), -1).unwrap();
        assert_eq!(tree.value(text), &Value::Text(vec![0xA9]));
    }

    #[test]
    fn other_packages_do_not_switch_encoding() {
        let mut parser = Parser::new(b"\\usepackage[latin1]{fontenc}", Default::default());
        parser.parse().unwrap();
        assert_eq!(parser.encoding(), Encoding::Utf8);
    }

    macro_rules! failure_tests {
        ( $( ($name: ident, $source: expr, $want: pat, $line: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let err = parse_err($source);
                assert!(matches!(err.kind, $want), "got {:?}", err.kind);
                assert_eq!(err.line, $line);
            }
            )+
        };
    }

    failure_tests![
        (
            end_across_group,
            r"\begin{center} { \end{center} }",
            ErrorKind::NoMatchingBegin { .. },
            1
        ),
        (
            end_name_mismatch,
            "\\begin{quote} ...\n\\end{itemize}",
            ErrorKind::NoMatchingBegin { .. },
            2
        ),
        (unmatched_brace, "a }", ErrorKind::UnmatchedCloser { .. }, 1),
        (unmatched_paren, r"a \)", ErrorKind::UnmatchedCloser { .. }, 1),
        (
            mismatched_math_closer,
            r"\( a \]",
            ErrorKind::UnmatchedCloser { .. },
            1
        ),
        (unclosed_brace, "\n{a", ErrorKind::UnclosedDelimiter { .. }, 2),
        (unclosed_math, "$a", ErrorKind::UnclosedDelimiter { .. }, 1),
        (
            unclosed_environment,
            "x\n\\begin{document}\nabc",
            ErrorKind::UnclosedEnvironment { .. },
            2
        ),
        (
            end_without_name,
            r"\end center",
            ErrorKind::MissingEnvironmentName,
            1
        ),
        (
            end_at_end_of_input,
            r"\end",
            ErrorKind::MissingEnvironmentName,
            1
        ),
        (
            unsupported_encoding,
            r"\usepackage[koi8-r]{inputenc}",
            ErrorKind::UnsupportedEncoding { .. },
            1
        ),
        (unterminated_verb, r"\verb|abc", ErrorKind::UnterminatedVerb, 1),
        (verb_at_end_of_input, r"\verb", ErrorKind::UnterminatedVerb, 1),
        (
            unterminated_raw_environment,
            "\\begin{verbatim}\nabc",
            ErrorKind::UnterminatedRawEnvironment { .. },
            1
        ),
        (
            malformed_catcode_number,
            "\\catcode\"g=11",
            ErrorKind::MalformedNumber { .. },
            1
        ),
    ];

    #[test]
    fn error_carries_partial_tree() {
        let err = parse_err("\\a{b}\n\\begin{x}\n}");
        let dump = err.tree_dump().unwrap();
        assert!(dump.contains("Command \\a"), "{dump}");
        let tree = err.partial_tree().unwrap();
        assert_eq!(tree.to_latex_string(tree.root()), "\\a{b}\n\\begin{x}\n");
    }

    #[test]
    fn partial_tree_can_be_disabled() {
        let options = ParserOptions::default().with_keep_partial_tree(false);
        let err = Parser::new(b"}", options).parse().err().unwrap();
        assert!(err.partial_tree().is_none());
    }

    #[test]
    fn partial_tree_includes_open_delimiters() {
        let err = parse_err("{a $b");
        let tree = err.partial_tree().unwrap();
        assert_eq!(tree.to_latex_string(tree.root()), "{a $b");
    }
}
