//! Interpreter for category code assignments.
//!
//! The interpreter watches the significant tokens the lexer produces, before the parser
//!     sees them, and applies assignments like `` \catcode`\@=11 `` to the lexer's table as
//!     soon as the assignment is complete.
//! Because the lexer is just in time, the very next token is lexed with the new code.
//!
//! The grammar recognized is
//!
//! ```text
//! \catcode <number> [=] <number>
//! \catcode <number> [=] (\active | \letter | \other)
//! \makeatletter
//! \makeatother
//! ```
//!
//! Tokens that don't fit the grammar are not errors: the interpreter just returns to
//!     its idle state.
//! The exceptions are malformed numbers and numbers out of range.

use super::number::{self, Scan};
use crate::error::{Error, Kind as ErrorKind};
use crate::token::lexer::Lexer;
use crate::token::{CatCode, Kind, Token};
use std::ops::Range;

/// Largest valid character code.
pub const MAX_CHARACTER_CODE: i64 = 0x10FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ExpectingTarget,
    ExpectingValueOrEquals { target: u32 },
    ExpectingValue { target: u32 },
}

#[derive(Debug)]
pub(crate) struct Interpreter {
    state: State,
    // Set when a text token ended with a backtick.
    // The character is then the next token, like the `\@` in `` `\@ ``.
    pending_character: Option<PendingCharacter>,
}

#[derive(Debug, Clone, Copy)]
struct PendingCharacter {
    negative: bool,
    start: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter {
            state: State::Idle,
            pending_character: None,
        }
    }
}

fn symbolic_cat_code(name: &[u8]) -> Option<CatCode> {
    match name {
        b"\\active" => Some(CatCode::Active),
        b"\\letter" => Some(CatCode::Letter),
        b"\\other" => Some(CatCode::Other),
        _ => None,
    }
}

impl Interpreter {
    /// Inspects the next token.
    ///
    /// This must be called for every token, before the next token is requested from the lexer.
    ///
    /// Returns true if the token is the character of a `` ` `` literal, like the `{` in
    ///     `` \catcode`{=12 ``, and must be parsed as text rather than by its category.
    pub(crate) fn observe(&mut self, lexer: &mut Lexer, token: &Token) -> Result<bool, Error> {
        if token.is_insignificant() {
            return Ok(false);
        }
        if let Some(pending) = self.pending_character.take() {
            if let Some((code_point, len)) = character_literal(lexer, token) {
                let value = code_point as i64;
                let value = if pending.negative { -value } else { value };
                let end = token.span.start + len;
                self.accept_number(lexer, value, pending.start..end, token.line)?;
                if end < token.span.end {
                    self.observe_text(lexer, token, len)?;
                }
                return Ok(token.kind != Kind::Command);
            }
            self.reset(lexer);
        }
        match token.kind {
            Kind::Command => self.observe_command(lexer, token)?,
            Kind::Text if self.state != State::Idle => self.observe_text(lexer, token, 0)?,
            _ => self.reset(lexer),
        }
        Ok(false)
    }

    fn observe_command(&mut self, lexer: &mut Lexer, token: &Token) -> Result<(), Error> {
        let name = lexer.slice(token.span.clone());
        match name {
            b"\\catcode" => {
                self.state = State::ExpectingTarget;
                lexer.set_whitespace_in_text(false);
                return Ok(());
            }
            b"\\makeatletter" => {
                log::debug!("line {}: \\makeatletter", token.line);
                lexer.set_cat_code('@' as u32, CatCode::Letter);
            }
            b"\\makeatother" => {
                log::debug!("line {}: \\makeatother", token.line);
                lexer.set_cat_code('@' as u32, CatCode::Other);
            }
            _ => {
                if let State::ExpectingValue { target } | State::ExpectingValueOrEquals { target } =
                    self.state
                {
                    if let Some(cat_code) = symbolic_cat_code(name) {
                        assign(lexer, target, cat_code, token.line);
                    }
                }
            }
        }
        self.reset(lexer);
        Ok(())
    }

    fn observe_text(&mut self, lexer: &mut Lexer, token: &Token, start: usize) -> Result<(), Error> {
        let bytes = lexer.slice(token.span.clone());
        let offset = token.span.start;
        let mut i = start;
        while i < bytes.len() {
            match self.state {
                State::Idle => break,
                State::ExpectingValueOrEquals { target } if bytes[i] == b'=' => {
                    self.state = State::ExpectingValue { target };
                    i += 1;
                }
                State::ExpectingTarget
                | State::ExpectingValueOrEquals { .. }
                | State::ExpectingValue { .. } => match number::scan(bytes, i, lexer.encoding()) {
                    Scan::NotANumber => {
                        self.reset(lexer);
                    }
                    Scan::Number { value, end } => {
                        self.accept_number(lexer, value, offset + i..offset + end, token.line)?;
                        i = end;
                    }
                    Scan::PendingCharacter { negative } => {
                        self.pending_character = Some(PendingCharacter {
                            negative,
                            start: offset + i,
                        });
                        break;
                    }
                    Scan::Malformed { end } => {
                        let literal = String::from_utf8_lossy(&bytes[i..end]).into_owned();
                        return Err(Error::new(ErrorKind::MalformedNumber { literal }, token.line)
                            .with_span(lexer.source(), offset + i..offset + end));
                    }
                },
            }
        }
        Ok(())
    }

    fn accept_number(
        &mut self,
        lexer: &mut Lexer,
        value: i64,
        span: Range<usize>,
        line: usize,
    ) -> Result<(), Error> {
        match self.state {
            State::Idle => {}
            State::ExpectingTarget => {
                if !(0..=MAX_CHARACTER_CODE).contains(&value) {
                    return Err(
                        Error::new(ErrorKind::InvalidCharacterCode { value }, line)
                            .with_span(lexer.source(), span),
                    );
                }
                self.state = State::ExpectingValueOrEquals {
                    target: value as u32,
                };
            }
            State::ExpectingValueOrEquals { target } | State::ExpectingValue { target } => {
                let cat_code = u8::try_from(value)
                    .ok()
                    .and_then(|u| CatCode::try_from(u).ok());
                match cat_code {
                    None => {
                        return Err(Error::new(ErrorKind::InvalidCatCode { value }, line)
                            .with_span(lexer.source(), span))
                    }
                    Some(cat_code) => assign(lexer, target, cat_code, line),
                }
                self.reset(lexer);
            }
        }
        Ok(())
    }

    fn reset(&mut self, lexer: &mut Lexer) {
        self.state = State::Idle;
        self.pending_character = None;
        lexer.set_whitespace_in_text(true);
    }
}

fn assign(lexer: &mut Lexer, target: u32, cat_code: CatCode, line: usize) {
    log::debug!("line {line}: category code of {target:#x} set to {cat_code}");
    lexer.set_cat_code(target, cat_code);
}

/// Returns the character code named by the token after a `` ` ``,
///     and the number of bytes of the token the character spans.
///
/// The character may be escaped, like `\%`, or be an active character.
/// Otherwise it is the first character of the token, whatever its category code.
/// Only text tokens may continue after the character; the rest of the text is
///     still part of the assignment, like the `=11` in `` \catcode`#=11 ``.
fn character_literal(lexer: &Lexer, token: &Token) -> Option<(u32, usize)> {
    let bytes = lexer.slice(token.span.clone());
    let encoding = lexer.encoding();
    let (first_len, first) = encoding.decode(bytes)?;
    match token.kind {
        Kind::Command => {
            let rest = &bytes[first_len..];
            if rest.is_empty() {
                // Active character.
                return Some((first, first_len));
            }
            let (len, code_point) = encoding.decode(rest)?;
            if len == rest.len() {
                Some((code_point, bytes.len()))
            } else {
                None
            }
        }
        Kind::Text => Some((first, first_len)),
        Kind::GroupOpen
        | Kind::GroupClose
        | Kind::MathToggle
        | Kind::AlignTab
        | Kind::OptOpen
        | Kind::OptClose => {
            // `$$` is two characters.
            if first_len == bytes.len() {
                Some((first, first_len))
            } else {
                None
            }
        }
        Kind::Whitespace | Kind::Comment => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Encoding;

    fn run(input: &str) -> Result<(Lexer, Vec<(Kind, String)>), Error> {
        let mut lexer = Lexer::new(input.as_bytes(), Encoding::Utf8);
        let mut interpreter: Interpreter = Default::default();
        let mut tokens = vec![];
        while let Some(token) = lexer.next() {
            let kind = if interpreter.observe(&mut lexer, &token)? {
                Kind::Text
            } else {
                token.kind
            };
            tokens.push((
                kind,
                String::from_utf8_lossy(lexer.slice(token.span)).into_owned(),
            ));
        }
        Ok((lexer, tokens))
    }

    macro_rules! assignment_tests {
        ( $( ($name: ident, $input: expr, $char: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let (lexer, _) = run($input).unwrap();
                assert_eq!(lexer.cat_code($char as u32), $want);
            }
            )+
        };
    }

    assignment_tests![
        (decimal, r"\catcode 64=11", '@', CatCode::Letter),
        (decimal_without_equals, r"\catcode 64 11", '@', CatCode::Letter),
        (octal, r"\catcode'100=11", '@', CatCode::Letter),
        (hexadecimal, r#"\catcode"40=11"#, '@', CatCode::Letter),
        (character, r"\catcode`a=12", 'a', CatCode::Other),
        (escaped_character, r"\catcode`\@=11", '@', CatCode::Letter),
        (spaced, "\\catcode`\\@ = 11 @asLetter", '@', CatCode::Letter),
        (symbolic_active, r"\catcode`\~=\active", '~', CatCode::Active),
        (symbolic_letter, r"\catcode`\@=\letter", '@', CatCode::Letter),
        (symbolic_other, r"\catcode`\a=\other", 'a', CatCode::Other),
        (signed_value, r"\catcode`\@=+11", '@', CatCode::Letter),
        (bracket, r"\catcode`[=1", '[', CatCode::BeginGroup),
        (alignment_tab, r"\catcode`&=12", '&', CatCode::Other),
        (parameter, r"\catcode`#=11", '#', CatCode::Letter),
        (math_shift, r"\catcode`$=12", '$', CatCode::Other),
        (begin_group, r"\catcode`{=12", '{', CatCode::Other),
        (end_group, r"\catcode`}=12", '}', CatCode::Other),
        (character_after_space, "\\catcode` a=12", 'a', CatCode::Other),
        (double_dollar_is_not_a_character, r"\catcode`$$=12", '$', CatCode::MathShift),
        (multi_byte, r"\catcode`€=13", '€', CatCode::Active),
        (hexadecimal_multi_byte, r#"\catcode"20AC=13"#, '€', CatCode::Active),
        (makeatletter, r"\makeatletter", '@', CatCode::Letter),
        (makeatother, r"\makeatletter\makeatother", '@', CatCode::Other),
        (newline_separates_numbers, "\\catcode 64\n11", '@', CatCode::Letter),
        (not_a_number_resets, r"\catcode x=11", 'x', CatCode::Letter),
        (interrupted_assignment, r"\catcode 64 \relax 11", '@', CatCode::Other),
    ];

    #[test]
    fn assignment_affects_next_token() {
        let (_, tokens) = run(r"\catcode`\@=11 \foo@bar").unwrap();
        assert_eq!(tokens.last(), Some(&(Kind::Command, r"\foo@bar".to_string())));
    }

    #[test]
    fn makeatletter_affects_next_token() {
        let (_, tokens) = run(r"\makeatletter\my@command").unwrap();
        assert_eq!(tokens.last(), Some(&(Kind::Command, r"\my@command".to_string())));
    }

    #[test]
    fn active_multi_byte_character() {
        let (_, tokens) = run("\\catcode`€=13 €").unwrap();
        assert_eq!(tokens.last(), Some(&(Kind::Command, "€".to_string())));
    }

    #[test]
    fn character_literal_is_text() {
        let (_, tokens) = run(r"\catcode`{=12 {").unwrap();
        assert_eq!(
            tokens,
            vec![
                (Kind::Command, r"\catcode".to_string()),
                (Kind::Text, "`".to_string()),
                (Kind::Text, "{".to_string()),
                (Kind::Text, "=12".to_string()),
                (Kind::Whitespace, " ".to_string()),
                (Kind::Text, "{".to_string()),
            ]
        );
    }

    #[test]
    fn escaped_character_literal_stays_a_command() {
        let (_, tokens) = run(r"\catcode`\{=12").unwrap();
        assert_eq!(tokens[2], (Kind::Command, r"\{".to_string()));
    }

    #[test]
    fn whitespace_in_text_restored() {
        let (_, tokens) = run(r"\catcode 64=11 a b").unwrap();
        assert_eq!(tokens.last(), Some(&(Kind::Text, "a b".to_string())));
    }

    macro_rules! error_tests {
        ( $( ($name: ident, $input: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let err = run($input).err().unwrap();
                assert_eq!(err.kind, $want);
            }
            )+
        };
    }

    error_tests![
        (
            malformed_hexadecimal,
            r#"\catcode"ff=11"#,
            ErrorKind::MalformedNumber {
                literal: "\"".into()
            }
        ),
        (
            malformed_octal,
            r"\catcode 64='9",
            ErrorKind::MalformedNumber {
                literal: "'".into()
            }
        ),
        (
            cat_code_too_big,
            r"\catcode 64=16",
            ErrorKind::InvalidCatCode { value: 16 }
        ),
        (
            negative_cat_code,
            r"\catcode 64=-1",
            ErrorKind::InvalidCatCode { value: -1 }
        ),
        (
            negative_character_code,
            r"\catcode-1=11",
            ErrorKind::InvalidCharacterCode { value: -1 }
        ),
        (
            character_code_too_big,
            r#"\catcode"110000=11"#,
            ErrorKind::InvalidCharacterCode { value: 0x110000 }
        ),
    ];

    #[test]
    fn error_span_covers_number() {
        let err = run(r"\catcode 64=16").err().unwrap();
        assert_eq!(err.span, Some(12..14));
        assert_eq!(err.line, 1);
    }
}
