//! Hex helpers for names and expressions that must survive transport quoting.

use crate::DecodeError;

/// Encodes the UTF-8 bytes of `text` as lowercase hex pairs.
#[must_use]
pub fn to_hex(text: &str) -> String {
    encode_bytes(text.as_bytes())
}

/// Decodes hex pairs produced by [`to_hex`] back to text.
///
/// Invalid pairs are skipped and invalid UTF-8 is replaced, mirroring the
/// lenient behavior expected of display code.
#[must_use]
pub fn from_hex(text: &str) -> String {
    String::from_utf8_lossy(&decode_bytes_lenient(text)).into_owned()
}

/// Encodes raw bytes as lowercase hex pairs.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(DIGITS[usize::from(byte >> 4)]));
        out.push(char::from(DIGITS[usize::from(byte & 0x0f)]));
    }
    out
}

/// Strictly decodes hex pairs into bytes.
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    let text = text.trim();
    if text.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex);
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(high), Some(low)) => Ok(high << 4 | low),
            _ => Err(DecodeError::InvalidHex),
        })
        .collect()
}

/// Decodes hex pairs, ignoring anything that is not a hex digit.
#[must_use]
pub fn decode_bytes_lenient(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut pending: Option<u8> = None;
    for digit in text.bytes().filter_map(hex_value) {
        match pending.take() {
            Some(high) => out.push(high << 4 | digit),
            None => pending = Some(digit),
        }
    }
    out
}

pub(crate) fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
