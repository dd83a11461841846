//! Parse errors
//!
//! Parsing either succeeds completely or fails with a single [Error].
//! Irregular input that is still legal as literal prose, like a stray `]`,
//!     never produces an error; see the [parse](crate::parse) module.

use crate::tree::Tree;
use std::ops::Range;

pub mod display;

/// The kind of a parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// A `}`, `$`, `$$`, `\)` or `\]` with no matching opener.
    UnmatchedCloser { closer: String },
    /// A `{` or math opener still open at the end of the input.
    UnclosedDelimiter { opener: String },
    /// A `\begin{name}` with no matching `\end{name}`.
    UnclosedEnvironment { name: String },
    /// An `\end{name}` with no matching `\begin{name}` in the same group.
    NoMatchingBegin { name: String },
    /// An `\end` not followed by a braced environment name.
    MissingEnvironmentName,
    /// A number in a `\catcode` assignment with a radix prefix but no valid digits.
    MalformedNumber { literal: String },
    /// A `\catcode` value outside the range 0 to 15.
    InvalidCatCode { value: i64 },
    /// A `\catcode` target that is not a valid character code.
    InvalidCharacterCode { value: i64 },
    /// An `inputenc` option naming an encoding that is not supported.
    UnsupportedEncoding { name: String },
    /// The input ended inside `\verb`.
    UnterminatedVerb,
    /// The input ended inside a raw environment like `verbatim`.
    UnterminatedRawEnvironment { name: String },
}

impl Kind {
    /// A one-line description of the error.
    pub fn title(&self) -> String {
        use Kind::*;
        match self {
            UnmatchedCloser { closer } => format!["unmatched closing delimiter `{closer}`"],
            UnclosedDelimiter { opener } => format!["delimiter `{opener}` is never closed"],
            UnclosedEnvironment { name } => format!["environment `{name}` is never closed"],
            NoMatchingBegin { name } => {
                format!["no matching opener found for `\\end{{{name}}}`"]
            }
            MissingEnvironmentName => "`\\end` is missing its environment name".into(),
            MalformedNumber { literal } => format!["malformed number `{literal}`"],
            InvalidCatCode { value } => format!["invalid category code {value}"],
            InvalidCharacterCode { value } => format!["invalid character code {value}"],
            UnsupportedEncoding { name } => format!["unsupported input encoding `{name}`"],
            UnterminatedVerb => "input ended inside `\\verb`".into(),
            UnterminatedRawEnvironment { name } => {
                format!["input ended inside the `{name}` environment"]
            }
        }
    }

    /// Further details about the error.
    pub fn notes(&self) -> Vec<String> {
        use Kind::*;
        match self {
            UnmatchedCloser { .. } => vec![],
            UnclosedDelimiter { .. } => vec!["the delimiter is opened here".into()],
            UnclosedEnvironment { name } => {
                vec![format!["expected `\\end{{{name}}}` before the end of the input"]]
            }
            NoMatchingBegin { .. } => vec![
                "an environment must be closed in the same group it was opened in".into(),
            ],
            MissingEnvironmentName => vec!["the name must be given in braces, as in `\\end{document}`".into()],
            MalformedNumber { .. } => vec![
                "octal numbers are prefixed by ' and use digits 0-7".into(),
                "hexadecimal numbers are prefixed by \" and use digits 0-9 and A-F".into(),
            ],
            InvalidCatCode { .. } => vec!["category codes are in the range [0, 15]".into()],
            InvalidCharacterCode { .. } => {
                vec!["character codes are in the range [0, 1114111]".into()]
            }
            UnsupportedEncoding { .. } => {
                vec!["supported encodings are ascii, latin1, latin9, utf8 and utf8x".into()]
            }
            UnterminatedVerb => vec!["the verbatim text must end with the delimiter it starts with".into()],
            UnterminatedRawEnvironment { name } => {
                vec![format!["the body is read verbatim up to `\\end{{{name}}}`"]]
            }
        }
    }
}

/// The source line an error occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub content: String,
    /// Byte offset of the error within the line.
    pub column: usize,
    /// Length in bytes of the offending text.
    pub len: usize,
}

impl SourceLine {
    /// Extracts the line containing the start of the span.
    pub(crate) fn new(source: &[u8], span: &Range<usize>) -> SourceLine {
        let start = span.start.min(source.len());
        let line_start = source[..start]
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = source[start..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|i| start + i)
            .unwrap_or(source.len());
        let end = span.end.min(line_end).max(start);
        SourceLine {
            content: String::from_utf8_lossy(&source[line_start..line_end])
                .trim_end_matches('\r')
                .to_string(),
            column: String::from_utf8_lossy(&source[line_start..start]).len(),
            len: String::from_utf8_lossy(&source[start..end]).len(),
        }
    }
}

/// A parse error.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: Kind,
    /// Line the error is reported at, starting at 1.
    pub line: usize,
    /// Byte range of the offending text, if known.
    pub span: Option<Range<usize>>,
    source_line: Option<SourceLine>,
    partial_tree: Option<Box<Tree>>,
}

impl Error {
    pub fn new(kind: Kind, line: usize) -> Error {
        Error {
            kind,
            line,
            span: None,
            source_line: None,
            partial_tree: None,
        }
    }

    /// Attaches the byte range of the offending text and records the source line it is on.
    pub(crate) fn with_span(mut self, source: &[u8], span: Range<usize>) -> Error {
        self.source_line = Some(SourceLine::new(source, &span));
        self.span = Some(span);
        self
    }

    pub(crate) fn with_partial_tree(mut self, tree: Tree) -> Error {
        self.partial_tree = Some(Box::new(tree));
        self
    }

    pub fn title(&self) -> String {
        self.kind.title()
    }

    pub fn notes(&self) -> Vec<String> {
        self.kind.notes()
    }

    pub fn source_line(&self) -> Option<&SourceLine> {
        self.source_line.as_ref()
    }

    /// The tree built before the error occurred.
    ///
    /// Nodes that were still waiting to be reduced are attached directly to the root.
    pub fn partial_tree(&self) -> Option<&Tree> {
        self.partial_tree.as_deref()
    }

    /// Renders the tree built before the error occurred.
    pub fn tree_dump(&self) -> Option<String> {
        self.partial_tree
            .as_ref()
            .map(|tree| tree.dump(tree.root()).to_string())
    }

    /// Builds an ariadne report for the error.
    ///
    /// The span of the report is a byte range, so the report should be configured with
    ///     [ariadne::IndexType::Byte].
    #[cfg(feature = "ariadne")]
    pub fn ariadne_report<'a>(
        &self,
        file_name: &'a str,
    ) -> ariadne::Report<'static, (&'a str, std::ops::Range<usize>)> {
        let span = self.span.clone().unwrap_or(0..0);
        let mut report = ariadne::Report::build(ariadne::ReportKind::Error, (file_name, span.clone()))
            .with_config(ariadne::Config::default().with_index_type(ariadne::IndexType::Byte))
            .with_message(self.title());
        if self.span.is_some() {
            report = report.with_label(
                ariadne::Label::new((file_name, span))
                    .with_message(format!["line {}", self.line])
                    .with_color(ariadne::Color::BrightRed),
            );
        }
        for note in self.notes() {
            report = report.with_note(note);
        }
        report.finish()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display::format_error(f, self)
    }
}

impl std::error::Error for Error {}
