//! # Latexlang: a lossless LaTeX parser.
//!
//! This crate parses LaTeX source into a tree that can be queried, edited and rendered back
//!     to source.
//! Rendering an unedited tree reproduces the input byte for byte,
//!     including whitespace, comments and the exact spelling of every delimiter.
//!
//! ```
//! let source = r"\section{Intro} The interval is [0, 1].";
//! let tree = latexlang::parse_str(source).unwrap();
//! let section = tree.find_command(tree.root(), "section").unwrap();
//! assert_eq!(tree.get_text_string(section), "Intro");
//! assert_eq!(tree.to_latex_string(tree.root()), source);
//! ```
//!
//! Parsing is structural, not semantic: macros are not expanded.
//! The exceptions are category code assignments (`\catcode`, `\makeatletter`),
//!     which change how the rest of the input is lexed,
//!     and the `inputenc` package, which changes the input encoding.

pub mod error;
pub mod parse;
pub mod search;
pub mod token;
pub mod tree;

pub use error::Error;
pub use parse::{Parser, ParserOptions};
pub use tree::{NodeId, NodeKind, Tree, Value};

/// Parses LaTeX source using the default options.
pub fn parse(source: &[u8]) -> Result<Tree, Error> {
    parse_with_options(source, Default::default())
}

/// Parses LaTeX source using the default options.
pub fn parse_str(source: &str) -> Result<Tree, Error> {
    parse(source.as_bytes())
}

/// Parses LaTeX source using the provided options.
pub fn parse_with_options(source: &[u8], options: ParserOptions) -> Result<Tree, Error> {
    Parser::new(source, options).parse()
}
