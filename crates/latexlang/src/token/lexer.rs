//! The LaTeX lexer, which reads a byte buffer and outputs LaTeX tokens.
//!
//! Like TeX itself the lexer is "just in time": it only produces the next token when that
//!     token is requested.
//! Lexing is controlled by category codes which can change at runtime based on the tokens
//!     the lexer has just produced.
//! Consider this snippet with the default category codes:
//! ```tex
//! \makeatletter \my@command
//! ```
//! If tokenized as a batch, the `@` would be lexed as a character of category code other
//!     and `\my` would be a command followed by the text `@command`.
//! However the parser reacts to `\makeatletter` by changing the category code of `@` to letter
//!     before requesting the next token, and so `\my@command` is a single command.
//!
//! The lexer never interprets tokens itself and never reports errors.
//! Every byte of the input ends up in exactly one token,
//!     which is what makes exact re-serialization of the parse tree possible.

use crate::token::{CatCode, CatCodeTable, Encoding, Kind, Token};
use std::ops::Range;

/// The Latexlang lexer
pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    cat_codes: CatCodeTable,
    encoding: Encoding,
    whitespace_in_text: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a [u8], encoding: Encoding) -> Lexer<'a> {
        Lexer {
            source,
            pos: 0,
            line: 1,
            cat_codes: CatCodeTable::new_with_latex_defaults(),
            encoding,
            whitespace_in_text: true,
        }
    }

    /// Returns the next token, or [None] if the input has been exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Token> {
        let start = self.pos;
        let line = self.line;
        let (len, code_point) = self.encoding.decode(&self.source[self.pos..])?;
        let kind = match self.source[self.pos] {
            // Brackets are always tokenized as brackets.
            // The parser decides whether they are structural or literal.
            b'[' => {
                self.advance(1);
                Kind::OptOpen
            }
            b']' => {
                self.advance(1);
                Kind::OptClose
            }
            _ => match self.cat_codes.get(code_point) {
                CatCode::Escape => {
                    self.advance(len);
                    self.read_command_name();
                    Kind::Command
                }
                CatCode::BeginGroup => {
                    self.advance(len);
                    Kind::GroupOpen
                }
                CatCode::EndGroup => {
                    self.advance(len);
                    Kind::GroupClose
                }
                CatCode::MathShift => {
                    self.advance(len);
                    // `$$` is a single token.
                    if self.source[self.pos..].starts_with(&self.source[start..start + len]) {
                        self.advance(len);
                    }
                    Kind::MathToggle
                }
                CatCode::AlignmentTab => {
                    self.advance(len);
                    Kind::AlignTab
                }
                CatCode::Space | CatCode::EndOfLine => {
                    self.advance(len);
                    self.advance_while(|code, _| code.is_whitespace());
                    Kind::Whitespace
                }
                CatCode::Active => {
                    self.advance(len);
                    Kind::Command
                }
                CatCode::Comment => {
                    let end = match self.source[self.pos..].iter().position(|b| *b == b'\n') {
                        None => self.source.len(),
                        Some(i) => self.pos + i + 1,
                    };
                    self.advance(end - self.pos);
                    Kind::Comment
                }
                CatCode::Parameter | CatCode::Ignored | CatCode::Invalid => {
                    self.advance(len);
                    Kind::Text
                }
                CatCode::Superscript
                | CatCode::Subscript
                | CatCode::Letter
                | CatCode::Other => {
                    self.advance(len);
                    let whitespace_in_text = self.whitespace_in_text;
                    self.advance_while(|code, b| {
                        b != b'[' && b != b']' && code.continues_text(whitespace_in_text)
                    });
                    Kind::Text
                }
            },
        };
        Some(Token {
            kind,
            span: start..self.pos,
            line,
        })
    }

    fn read_command_name(&mut self) {
        let (len, code_point) = match self.encoding.decode(&self.source[self.pos..]) {
            // A lone escape character at the end of the input.
            None => return,
            Some(next) => next,
        };
        self.advance(len);
        if self.cat_codes.get(code_point) == CatCode::Letter {
            self.advance_while(|code, _| code == CatCode::Letter);
        }
    }

    fn advance_while<F: Fn(CatCode, u8) -> bool>(&mut self, f: F) {
        while let Some((len, code_point)) = self.encoding.decode(&self.source[self.pos..]) {
            if !f(self.cat_codes.get(code_point), self.source[self.pos]) {
                break;
            }
            self.advance(len);
        }
    }

    fn advance(&mut self, n: usize) {
        let end = (self.pos + n).min(self.source.len());
        self.line += self.source[self.pos..end]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.pos = end;
    }

    /// Returns the bytes of the next logical character without consuming it.
    pub fn peek_char(&self) -> Option<&'a [u8]> {
        let len = self.encoding.char_len(&self.source[self.pos..]);
        if len == 0 {
            return None;
        }
        Some(&self.source[self.pos..self.pos + len])
    }

    /// Consumes exactly one logical character without tokenizing it.
    ///
    /// Returns the byte range of the character, or [None] at the end of the input.
    pub fn read_char(&mut self) -> Option<Range<usize>> {
        let start = self.pos;
        let len = self.encoding.char_len(&self.source[self.pos..]);
        if len == 0 {
            return None;
        }
        self.advance(len);
        Some(start..self.pos)
    }

    /// Consumes raw bytes up to and including the next occurrence of `delimiter`.
    ///
    /// Returns the byte ranges of the text before the delimiter and of the delimiter itself.
    /// If the delimiter does not appear in the rest of the input, nothing is consumed and
    ///     [None] is returned.
    pub fn read_until(&mut self, delimiter: &[u8]) -> Option<(Range<usize>, Range<usize>)> {
        if delimiter.is_empty() {
            return Some((self.pos..self.pos, self.pos..self.pos));
        }
        let i = self.source[self.pos..]
            .windows(delimiter.len())
            .position(|window| window == delimiter)?;
        let body = self.pos..self.pos + i;
        let delimiter = body.end..body.end + delimiter.len();
        self.advance(delimiter.end - self.pos);
        Some((body, delimiter))
    }

    /// Returns the bytes of the source in the provided range.
    #[inline]
    pub fn slice(&self, range: Range<usize>) -> &'a [u8] {
        &self.source[range]
    }

    /// Returns the full source being lexed.
    #[inline]
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Line of the next unread byte, starting at 1.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn cat_code(&self, code_point: u32) -> CatCode {
        self.cat_codes.get(code_point)
    }

    /// Sets the category code of a character.
    ///
    /// The change only affects tokens produced after this call.
    pub fn set_cat_code(&mut self, code_point: u32, cat_code: CatCode) {
        self.cat_codes.insert(code_point, cat_code);
    }

    pub fn cat_codes(&self) -> &CatCodeTable {
        &self.cat_codes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Sets the encoding.
    ///
    /// The change only affects tokens produced after this call.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// Sets whether text tokens may contain whitespace characters.
    ///
    /// This is on by default.
    /// It is turned off while reading the numbers of a `\catcode` assignment
    ///     so that `\catcode 64\n11` yields two separate text tokens.
    pub fn set_whitespace_in_text(&mut self, allowed: bool) {
        self.whitespace_in_text = allowed;
    }
}
