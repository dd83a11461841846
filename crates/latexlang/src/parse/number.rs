//! TeX integer literals.
//!
//! The number may be octal (`'17`), decimal (`15`), hexadecimal (`"F`) or cast from a
//!     character (`` `A ``).
//! Any number of `+` and `-` signs may precede the number.
//! The full definition of a number in the TeX grammar is given on page 269 of the TeXBook.
//!
//! Numbers here are scanned from the bytes of a single text token.
//! A character cast whose character is not part of the same text token, as in `` `\% ``
//!     or `` `{ ``, spans two tokens and is completed by the caller.

use crate::token::Encoding;

/// Result of scanning for a number.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Scan {
    /// The bytes do not start with a number.
    NotANumber,
    /// A complete number; `end` is the offset just after it.
    Number { value: i64, end: usize },
    /// The bytes end with `` ` ``, so the character is in the next token.
    PendingCharacter { negative: bool },
    /// A radix prefix without a valid digit; `end` is the offset just after the prefix.
    Malformed { end: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Octal = 8,
    Decimal = 10,
    Hexadecimal = 16,
}

impl Radix {
    fn digit(&self, b: u8) -> Option<i64> {
        let d = match b {
            b'0'..=b'9' => b - b'0',
            // Like TeX, only uppercase hexadecimal digits are recognized.
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        if (d as i64) < *self as i64 {
            Some(d as i64)
        } else {
            None
        }
    }
}

/// Scans a number starting at `b[start]`.
pub(crate) fn scan(b: &[u8], start: usize, encoding: Encoding) -> Scan {
    let mut i = start;
    let mut negative = false;
    while let Some(c) = b.get(i) {
        match c {
            b'+' => {}
            b'-' => negative = !negative,
            _ => break,
        }
        i += 1;
    }
    let sign = if negative { -1 } else { 1 };
    let radix = match b.get(i) {
        None => return Scan::NotANumber,
        Some(b'`') => {
            i += 1;
            return match encoding.decode(&b[i..]) {
                None => Scan::PendingCharacter { negative },
                Some((n, code_point)) => Scan::Number {
                    value: sign * code_point as i64,
                    end: i + n,
                },
            };
        }
        Some(b'\'') => {
            i += 1;
            Radix::Octal
        }
        Some(b'"') => {
            i += 1;
            Radix::Hexadecimal
        }
        Some(b'0'..=b'9') => Radix::Decimal,
        Some(_) => return Scan::NotANumber,
    };
    let digits_start = i;
    let mut value: i64 = 0;
    while let Some(d) = b.get(i).and_then(|c| radix.digit(*c)) {
        value = add_lsd(value, radix as i64, d);
        i += 1;
    }
    if i == digits_start {
        return Scan::Malformed { end: i };
    }
    Scan::Number {
        value: sign * value,
        end: i,
    }
}

/// Appends a least significant digit, saturating at a value larger than any valid code.
fn add_lsd(n: i64, radix: i64, lsd: i64) -> i64 {
    n.checked_mul(radix)
        .and_then(|n| n.checked_add(lsd))
        .unwrap_or(i64::MAX)
        .min(i32::MAX as i64 + 1)
}
