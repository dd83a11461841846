//! Category codes and the mutable table the lexer consults.
use std::collections::HashMap;

use CatCode::*;

/// Enum representing all 16 category codes in TeX.
///
/// Each variant's documentation contains an example character which is mapped to that
/// category code in the default LaTeX table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatCode {
    /// Marks the beginning of a command.
    /// Example: `\`.
    Escape = 0,
    /// Begins a new group.
    /// Example: `{`.
    BeginGroup = 1,
    /// Ends an existing group.
    /// Example: `}`.
    EndGroup = 2,
    /// Starts or ends math mode.
    /// Example: `$`.
    MathShift = 3,
    /// Used in typesetting tables to align cells.
    /// Example: `&`.
    AlignmentTab = 4,
    /// Marks a new line in the input.
    ///
    /// The lexer treats this code exactly like [Space]:
    ///     line structure is preserved byte for byte in the parse tree anyway.
    EndOfLine = 5,
    /// Marks the beginning of a parameter number.
    /// Example: `#`.
    Parameter = 6,
    /// Example: `^`.
    Superscript = 7,
    /// Example: `_`.
    Subscript = 8,
    /// Character that TeX ignores.
    /// Example: ASCII null (0).
    ///
    /// Ignored characters still appear in the parse tree as text.
    Ignored = 9,
    /// Whitespace. Examples: ` `, `\t`, `\n`.
    Space = 10,
    /// A character that can be used in a multi-letter command name.
    /// Examples: `[a-zA-z]`.
    Letter = 11,
    /// A character that cannot be used in a multi-letter command name.
    /// Example: `@`.
    #[default]
    Other = 12,
    /// A single character that behaves like a command.
    /// Example: `~`.
    Active = 13,
    /// Marks the beginning of a comment that runs to the end of the line.
    /// Example: `%`.
    Comment = 14,
    /// An invalid character.
    /// Example: ASCII delete (127).
    Invalid = 15,
}

impl TryFrom<u8> for CatCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Escape),
            1 => Ok(BeginGroup),
            2 => Ok(EndGroup),
            3 => Ok(MathShift),
            4 => Ok(AlignmentTab),
            5 => Ok(EndOfLine),
            6 => Ok(Parameter),
            7 => Ok(Superscript),
            8 => Ok(Subscript),
            9 => Ok(Ignored),
            10 => Ok(Space),
            11 => Ok(Letter),
            12 => Ok(Other),
            13 => Ok(Active),
            14 => Ok(Comment),
            15 => Ok(Invalid),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for CatCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({})", self, *self as u8)
    }
}

impl CatCode {
    /// Whether characters with this code can continue a text run.
    pub(crate) fn continues_text(&self, whitespace_allowed: bool) -> bool {
        match self {
            Superscript | Subscript | Letter | Other => true,
            Space | EndOfLine => whitespace_allowed,
            _ => false,
        }
    }

    /// Whether characters with this code are lexed as whitespace.
    pub(crate) fn is_whitespace(&self) -> bool {
        matches!(self, Space | EndOfLine)
    }

    /// Default category codes in LaTeX for the 256 byte values.
    ///
    /// This starts from the plainTeX defaults (TeXBook p343) with two changes.
    /// Carriage return and line feed are [Space] because the lexer reads raw bytes rather
    ///     than TeX's line-by-line input with an appended `\endlinechar`.
    /// Every byte above 127 is [Other].
    pub const LATEX_DEFAULTS: [CatCode; 256] = {
        let mut table = [Other; 256];
        table[0x00] = Ignored;
        table[b'\t' as usize] = Space;
        table[b'\n' as usize] = Space;
        table[0x0C] = Active; // form feed
        table[b'\r' as usize] = Space;
        table[b' ' as usize] = Space;
        table[b'#' as usize] = Parameter;
        table[b'$' as usize] = MathShift;
        table[b'%' as usize] = Comment;
        table[b'&' as usize] = AlignmentTab;
        table[b'\\' as usize] = Escape;
        table[b'^' as usize] = Superscript;
        table[b'_' as usize] = Subscript;
        table[b'{' as usize] = BeginGroup;
        table[b'}' as usize] = EndGroup;
        table[b'~' as usize] = Active;
        table[0x7F] = Invalid;
        let mut u = b'A';
        while u <= b'Z' {
            table[u as usize] = Letter;
            table[(u + 32) as usize] = Letter;
            u += 1;
        }
        table
    };
}

/// Mutable map from characters to category codes.
///
/// Code points below 256 live in a flat array.
/// This covers every byte in the ASCII and Latin-1 encodings.
/// Larger code points can only be reached in UTF-8 mode and are stored sparsely.
#[derive(Debug, Clone)]
pub struct CatCodeTable {
    low: [CatCode; 256],
    high: HashMap<u32, CatCode>,
    default: CatCode,
}

impl CatCodeTable {
    /// Returns a table with every character mapped to [CatCode::Other].
    pub fn new() -> CatCodeTable {
        CatCodeTable {
            low: [Default::default(); 256],
            high: HashMap::new(),
            default: CatCode::default(),
        }
    }

    /// Returns a table with the default LaTeX category codes.
    pub fn new_with_latex_defaults() -> CatCodeTable {
        CatCodeTable {
            low: CatCode::LATEX_DEFAULTS,
            high: HashMap::new(),
            default: CatCode::default(),
        }
    }

    #[inline]
    pub fn get(&self, code_point: u32) -> CatCode {
        match self.low.get(code_point as usize) {
            Some(cat_code) => *cat_code,
            None => self.high.get(&code_point).copied().unwrap_or(self.default),
        }
    }

    pub fn insert(&mut self, code_point: u32, cat_code: CatCode) {
        match self.low.get_mut(code_point as usize) {
            Some(slot) => *slot = cat_code,
            None => {
                self.high.insert(code_point, cat_code);
            }
        }
    }
}

impl Default for CatCodeTable {
    fn default() -> Self {
        Self::new_with_latex_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_cat_code_to_and_from_u8() {
        for u in 0_u8..16 {
            let cat_code: CatCode = u.try_into().unwrap();
            assert_eq!(cat_code as u8, u);
        }
        assert_eq!(CatCode::try_from(16_u8), Err(()));
    }

    macro_rules! default_tests {
        ($( ($name: ident, $byte: expr, $want: expr), )+) => {
            $(
            #[test]
            fn $name() {
                let table = CatCodeTable::new_with_latex_defaults();
                assert_eq!(table.get($byte as u32), $want);
            }
            )+
        };
    }

    default_tests![
        (default_escape, b'\\', Escape),
        (default_begin_group, b'{', BeginGroup),
        (default_end_group, b'}', EndGroup),
        (default_math_shift, b'$', MathShift),
        (default_alignment_tab, b'&', AlignmentTab),
        (default_parameter, b'#', Parameter),
        (default_superscript, b'^', Superscript),
        (default_subscript, b'_', Subscript),
        (default_newline, b'\n', Space),
        (default_carriage_return, b'\r', Space),
        (default_tab, b'\t', Space),
        (default_lowercase_letter, b'q', Letter),
        (default_uppercase_letter, b'Q', Letter),
        (default_at_sign, b'@', Other),
        (default_bracket, b'[', Other),
        (default_tilde, b'~', Active),
        (default_comment, b'%', Comment),
        (default_delete, 0x7F_u8, Invalid),
        (default_high_byte, 0xE9_u8, Other),
    ];

    #[test]
    fn insert_low_and_high_code_points() {
        let mut table = CatCodeTable::new_with_latex_defaults();
        table.insert('@' as u32, Letter);
        table.insert(0x20AC, Active);
        assert_eq!(table.get('@' as u32), Letter);
        assert_eq!(table.get(0x20AC), Active);
        assert_eq!(table.get(0x20AD), Other);
    }
}
