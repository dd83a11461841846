//! Input encodings.
//!
//! The encoding decides how many bytes make up one logical character.
//! All offsets produced by the lexer are byte offsets regardless of the encoding.

/// Encoding used to group bytes into logical characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Every byte is one character.
    /// Bytes above 127 are classified by their byte value.
    Ascii,
    /// Every byte is one character whose code point is the byte value.
    Latin1,
    /// Multi-byte sequences form one character.
    /// Malformed sequences fall back to one character per byte.
    #[default]
    Utf8,
}

impl Encoding {
    /// Returns the encoding for an option passed to the `inputenc` package.
    pub fn from_inputenc_option(name: &str) -> Option<Encoding> {
        match name {
            "ascii" => Some(Encoding::Ascii),
            "latin1" | "latin9" => Some(Encoding::Latin1),
            "utf8" | "utf8x" => Some(Encoding::Utf8),
            _ => None,
        }
    }

    /// Returns the length in bytes and the code point of the character starting at `b[0]`.
    ///
    /// Returns [None] if `b` is empty.
    pub fn decode(&self, b: &[u8]) -> Option<(usize, u32)> {
        let first = *b.first()?;
        match self {
            Encoding::Ascii | Encoding::Latin1 => Some((1, first as u32)),
            Encoding::Utf8 => Some(decode_utf8(b).unwrap_or((1, first as u32))),
        }
    }

    /// Returns the length in bytes of the character starting at `b[0]`, or 0 if `b` is empty.
    #[inline]
    pub fn char_len(&self, b: &[u8]) -> usize {
        self.decode(b).map(|(n, _)| n).unwrap_or(0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
            Encoding::Utf8 => "utf8",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn decode_utf8(b: &[u8]) -> Option<(usize, u32)> {
    let first = b[0];
    let (len, initial) = match first {
        0x00..=0x7F => return Some((1, first as u32)),
        0xC2..=0xDF => (2, (first & 0x1F) as u32),
        0xE0..=0xEF => (3, (first & 0x0F) as u32),
        0xF0..=0xF4 => (4, (first & 0x07) as u32),
        _ => return None,
    };
    let tail = b.get(1..len)?;
    let mut code_point = initial;
    for &c in tail {
        if c & 0xC0 != 0x80 {
            return None;
        }
        code_point = (code_point << 6) | (c & 0x3F) as u32;
    }
    // Overlong encodings and surrogates are treated as malformed.
    char::from_u32(code_point)?;
    let min = match len {
        2 => 0x80,
        3 => 0x800,
        _ => 0x10000,
    };
    if code_point < min {
        return None;
    }
    Some((len, code_point))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EURO: &[u8] = "€".as_bytes();

    #[test]
    fn utf8_multi_byte_character_is_one_character() {
        assert_eq!(EURO.len(), 3);
        assert_eq!(Encoding::Utf8.decode(EURO), Some((3, 0x20AC)));
    }

    #[test]
    fn ascii_multi_byte_character_is_three_characters() {
        assert_eq!(Encoding::Ascii.decode(EURO), Some((1, 0xE2)));
        assert_eq!(Encoding::Ascii.decode(&EURO[1..]), Some((1, 0x82)));
        assert_eq!(Encoding::Ascii.decode(&EURO[2..]), Some((1, 0xAC)));
    }

    #[test]
    fn latin1_uses_byte_value_as_code_point() {
        assert_eq!(Encoding::Latin1.decode(&[0xE9, b'a']), Some((1, 0xE9)));
    }

    #[test]
    fn truncated_utf8_falls_back_to_single_bytes() {
        assert_eq!(Encoding::Utf8.decode(&EURO[..2]), Some((1, 0xE2)));
        assert_eq!(Encoding::Utf8.decode(&[0x82, b'a']), Some((1, 0x82)));
    }

    #[test]
    fn overlong_utf8_is_malformed() {
        assert_eq!(Encoding::Utf8.decode(&[0xE0, 0x80, 0x80]), Some((1, 0xE0)));
    }

    #[test]
    fn empty_input() {
        assert_eq!(Encoding::Utf8.decode(&[]), None);
        assert_eq!(Encoding::Utf8.char_len(&[]), 0);
    }

    #[test]
    fn inputenc_options() {
        assert_eq!(Encoding::from_inputenc_option("utf8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_inputenc_option("latin1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::from_inputenc_option("ascii"), Some(Encoding::Ascii));
        assert_eq!(Encoding::from_inputenc_option("koi8-r"), None);
    }
}
