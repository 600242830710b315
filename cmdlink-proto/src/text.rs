//! Byte-per-character text mapping used on the characteristic
//!
//! Written bytes are not UTF-8 decoded: every byte becomes the char with the
//! same code point (ISO 8859-1), so arbitrary bytes survive unchanged.

pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`decode`]. Chars above U+00FF have no byte form and are
/// replaced with `?`.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
