//! Conversions between UTF-16 code-unit offsets and UTF-8 byte indices.
//!
//! Selection offsets count UTF-16 code units, the unit a browser range uses
//! when it measures rendered text, while node text is stored as Rust strings.

/// Length of `s` in UTF-16 code units.
pub fn len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index of the UTF-16 offset `offset` in `s`.
///
/// An offset that falls between the two halves of a surrogate pair rounds up
/// to the end of that character. Offsets past the end clamp to `s.len()`.
pub fn byte_index(s: &str, offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        if units >= offset {
            return byte;
        }
        units += ch.len_utf16();
    }
    s.len()
}

/// Splits `s` at a UTF-16 offset.
pub fn split_at(s: &str, offset: usize) -> (&str, &str) {
    s.split_at(byte_index(s, offset))
}

/// Slice of `s` between two UTF-16 offsets.
pub fn slice(s: &str, start: usize, end: usize) -> &str {
    let start = byte_index(s, start);
    let end = byte_index(s, end).max(start);
    &s[start..end]
}

/// UTF-16 offset of the byte index `byte` in `s`.
pub fn offset_of_byte(s: &str, byte: usize) -> usize {
    len(&s[..floor_char_boundary(s, byte)])
}

fn floor_char_boundary(s: &str, byte: usize) -> usize {
    let mut byte = byte.min(s.len());
    while !s.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}
