//! C-string reading and escaping.

use tracing::debug;

use super::cursor::Cursor;
use crate::hex::hex_value;

/// Reads a double-quoted C string starting at the cursor.
///
/// The cursor ends just past the closing quote. An unterminated string is
/// clamped at the end of input and its partial content returned.
pub(crate) fn read_cstring(cursor: &mut Cursor<'_>) -> String {
    if !cursor.at(b'"') {
        debug!("MI parse error, double quote expected");
        // Consume something so callers make progress.
        cursor.advance_char();
        return String::new();
    }
    cursor.advance();
    let start = cursor.pos();
    let bytes = cursor.bytes();
    let mut end = start;
    let mut terminated = false;
    while end < bytes.len() {
        match bytes[end] {
            b'"' => {
                terminated = true;
                break;
            }
            b'\\' => end += 2,
            _ => end += 1,
        }
    }
    let end = end.min(bytes.len());
    if terminated {
        cursor.set_pos(end + 1);
    } else {
        debug!("MI parse error, unterminated string");
        cursor.set_pos(end);
    }
    unescape(&bytes[start..end])
}

fn unescape(raw: &[u8]) -> String {
    if !raw.contains(&b'\\') {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let c = raw[i];
        i += 1;
        if c != b'\\' {
            out.push(c);
            continue;
        }
        let Some(&escaped) = raw.get(i) else {
            debug!("MI parse error, unterminated backslash escape");
            break;
        };
        i += 1;
        match escaped {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'x' => {
                let mut value: u8 = 0;
                let mut digits = 0;
                while digits < 2 {
                    match raw.get(i).copied().and_then(hex_value) {
                        Some(digit) => {
                            value = value << 4 | digit;
                            digits += 1;
                            i += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    debug!("MI parse error, unrecognized hex escape");
                    out.push(b'x');
                } else {
                    out.push(value);
                }
            }
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match raw.get(i) {
                        Some(&digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            digits += 1;
                            i += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            other => {
                debug!("MI parse error, unrecognized backslash escape '\\{}'", other as char);
                out.push(other);
            }
        }
    }
    decode_bytes(out)
}

/// Escaped octets are usually UTF-8 sequences; anything else is Latin-1.
fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

/// Escapes `text` so that it can be embedded between double quotes.
#[must_use]
pub fn escape_cstring(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            '"' => out.push_str("\\\""),
            c if (c as u32) < 32 || c as u32 == 127 => {
                let code = c as u32;
                out.push('\\');
                out.push(char::from(b'0' + ((code >> 6) & 7) as u8));
                out.push(char::from(b'0' + ((code >> 3) & 7) as u8));
                out.push(char::from(b'0' + (code & 7) as u8));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> (String, usize) {
        let mut cursor = Cursor::new(text);
        let value = read_cstring(&mut cursor);
        (value, cursor.pos())
    }

    #[test]
    fn reads_simple_escapes() {
        assert_eq!(read(r#""a\tb\n\"q\"\\""#).0, "a\tb\n\"q\"\\");
    }

    #[test]
    fn reads_octal_and_hex_escapes() {
        assert_eq!(read(r#""\101\x42\0""#).0, "AB\0");
        // UTF-8 sequence written as octal escapes.
        assert_eq!(read(r#""\303\244""#).0, "ä");
        // A lone high byte falls back to Latin-1.
        assert_eq!(read(r#""\377""#).0, "ÿ");
    }

    #[test]
    fn stops_after_closing_quote() {
        let (value, pos) = read(r#""abc",rest"#);
        assert_eq!(value, "abc");
        assert_eq!(pos, 5);
    }

    #[test]
    fn unterminated_string_is_clamped() {
        let (value, pos) = read(r#""abc"#);
        assert_eq!(value, "abc");
        assert_eq!(pos, 4);

        let (value, pos) = read(r#""ab\"#);
        assert_eq!(value, "ab");
        assert_eq!(pos, 4);
    }

    #[test]
    fn escape_roundtrips_control_characters() {
        let text = "tab\tquote\"nul\u{0}del\u{7f}";
        let escaped = escape_cstring(text);
        assert_eq!(escaped, "tab\\tquote\\\"nul\\000del\\177");
        assert_eq!(read(&format!("\"{escaped}\"")).0, text);
    }
}
