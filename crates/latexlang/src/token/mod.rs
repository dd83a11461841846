//! LaTeX tokens, category codes and encodings.
//!
//! Tokens are thin: a kind, a half-open byte range into the source and the line the token
//!     starts on.
//! The bytes themselves are retrieved from the lexer using [lexer::Lexer::slice].

mod catcode;
mod encoding;
pub mod lexer;

pub use catcode::CatCode;
pub use catcode::CatCodeTable;
pub use encoding::Encoding;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// A control sequence like `\section` or `\%`, or an active character like `~`.
    Command,
    /// A character with category code 1; e.g. `{`.
    GroupOpen,
    /// A character with category code 2; e.g. `}`.
    GroupClose,
    /// `$` or `$$`.
    MathToggle,
    /// A character with category code 4; e.g. `&`.
    AlignTab,
    /// The byte `[`.
    OptOpen,
    /// The byte `]`.
    OptClose,
    /// A comment including its terminating newline, if any.
    Comment,
    /// A run of text characters.
    Text,
    /// A run of whitespace characters.
    Whitespace,
}

/// A LaTeX token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: Kind,
    /// Byte range of the token in the source.
    pub span: std::ops::Range<usize>,
    /// Line the token starts on, starting at 1.
    pub line: usize,
}

impl Token {
    #[inline]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Whether the token is ignored by the catcode interpreter and by bracket contextuality.
    #[inline]
    pub fn is_insignificant(&self) -> bool {
        matches!(self.kind, Kind::Whitespace | Kind::Comment)
    }
}
