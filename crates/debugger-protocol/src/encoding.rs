//! Decoders for the encoded scalar payloads produced by the dumper helpers.
//!
//! A value arrives as a (mostly hex) payload plus an encoding tag of the form
//! `type[:size[:quotes]]`. Besides real encodings, the tag can name a special
//! placeholder (`optimizedout`, `itemcount`, ...) whose payload is a count or
//! is ignored.
//!
//! Integer and array payloads are little-endian; hex floats are sent most
//! significant byte first.

use std::fmt::{self, Write as _};
use std::net::Ipv6Addr;

use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, Weekday};
use tracing::warn;

use crate::hex::{decode_bytes, decode_bytes_lenient};
use crate::number::format_compact;
use crate::DecodeError;

/// Payload encodings understood by [`decode_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingType {
    /// Plain text.
    #[default]
    Unencoded,
    HexEncodedLocal8Bit,
    HexEncodedLatin1,
    HexEncodedUtf8,
    HexEncodedUtf16,
    HexEncodedUcs4,
    HexEncodedSignedInteger,
    HexEncodedUnsignedInteger,
    HexEncodedFloat,
    /// Julian day number.
    JulianDate,
    MillisecondsSinceMidnight,
    /// `julianday/milliseconds`.
    JulianDateAndMillisecondsSinceMidnight,
    /// Textual address, `%`, and the hex-encoded UTF-16 scope id.
    IPv6AddressAndHexScopeId,
    /// `msecs/timespec/offset/timezone/status` of a date-time object.
    DateTimeInternal,
}

impl EncodingType {
    const NAMES: [(&'static str, EncodingType, usize, bool); 13] = [
        ("local8bit", Self::HexEncodedLocal8Bit, 1, true),
        ("latin1", Self::HexEncodedLatin1, 1, true),
        ("utf8", Self::HexEncodedUtf8, 1, true),
        ("utf16", Self::HexEncodedUtf16, 2, true),
        ("ucs4", Self::HexEncodedUcs4, 4, true),
        ("int", Self::HexEncodedSignedInteger, 0, false),
        ("uint", Self::HexEncodedUnsignedInteger, 0, false),
        ("float", Self::HexEncodedFloat, 0, false),
        ("juliandate", Self::JulianDate, 0, false),
        ("millisecondssincemidnight", Self::MillisecondsSinceMidnight, 0, false),
        (
            "juliandateandmillisecondssincemidnight",
            Self::JulianDateAndMillisecondsSinceMidnight,
            0,
            false,
        ),
        ("ipv6addressandhexscopeid", Self::IPv6AddressAndHexScopeId, 0, false),
        ("datetimeinternal", Self::DateTimeInternal, 0, false),
    ];

    /// Canonical tag name; empty for [`EncodingType::Unencoded`].
    #[must_use]
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, kind, _, _)| *kind == self)
            .map_or("", |(name, _, _, _)| name)
    }
}

/// A parsed encoding tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DebuggerEncoding {
    /// Payload type.
    pub kind: EncodingType,
    /// Element width in bytes.
    pub size: usize,
    /// Whether the decoded text is shown in double quotes.
    pub quotes: bool,
}

impl DebuggerEncoding {
    /// Parses `type[:size[:quotes]]`. Unknown type names stay `Unencoded`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split(':');
        let mut encoding = Self::default();
        if let Some(name) = parts.next() {
            if let Some((_, kind, size, quotes)) =
                EncodingType::NAMES.iter().find(|(known, ..)| *known == name)
            {
                encoding = Self {
                    kind: *kind,
                    size: *size,
                    quotes: *quotes,
                };
            }
        }
        if let Some(size) = parts.next() {
            encoding.size = size.trim().parse().unwrap_or(0);
        }
        if let Some(quotes) = parts.next() {
            encoding.quotes = quotes.trim().parse::<i32>().is_ok_and(|value| value != 0);
        }
        encoding
    }
}

impl fmt::Display for DebuggerEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.kind.name(),
            self.size,
            u8::from(self.quotes)
        )
    }
}

/// Decodes `payload` according to the `encoding` tag.
pub fn decode_data(payload: &str, encoding: &str) -> Result<String, DecodeError> {
    if encoding.is_empty() {
        return Ok(quote_unprintable_latin1(payload));
    }
    if let Some(special) = special_value(payload, encoding) {
        return Ok(special);
    }

    let enc = DebuggerEncoding::parse(encoding);
    let mut result = match enc.kind {
        EncodingType::Unencoded => {
            if !encoding.split(':').next().is_some_and(str::is_empty) {
                warn!(%encoding, "unknown value encoding");
                return Err(DecodeError::UnsupportedEncoding(encoding.to_string()));
            }
            quote_unprintable_latin1(payload)
        }
        EncodingType::HexEncodedLocal8Bit | EncodingType::HexEncodedUtf8 => {
            String::from_utf8_lossy(&decode_bytes_lenient(payload)).into_owned()
        }
        EncodingType::HexEncodedLatin1 => decode_bytes_lenient(payload)
            .into_iter()
            .map(char::from)
            .collect(),
        EncodingType::HexEncodedUtf16 => {
            let units: Vec<u16> = decode_bytes_lenient(payload)
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        EncodingType::HexEncodedUcs4 => decode_bytes_lenient(payload)
            .chunks_exact(4)
            .map(|quad| {
                char::from_u32(u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        EncodingType::HexEncodedSignedInteger => {
            let bytes = sized_payload(payload, enc, encoding)?;
            signed_le(&bytes).to_string()
        }
        EncodingType::HexEncodedUnsignedInteger => {
            let bytes = sized_payload(payload, enc, encoding)?;
            unsigned_le(&bytes).to_string()
        }
        EncodingType::HexEncodedFloat => {
            let mut bytes = sized_payload(payload, enc, encoding)?;
            bytes.reverse();
            let value = match enc.size {
                4 => f64::from(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
                _ => f64::from_le_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6],
                    bytes[7],
                ]),
            };
            format_compact(value, 6)
        }
        EncodingType::JulianDate => text_date(julian_date(payload)?),
        EncodingType::MillisecondsSinceMidnight => text_time(time_of_day(payload)?),
        EncodingType::JulianDateAndMillisecondsSinceMidnight => {
            let (day, millis) = payload
                .split_once('/')
                .ok_or_else(|| DecodeError::InvalidDateTime(payload.to_string()))?;
            text_date_time(PrimitiveDateTime::new(
                julian_date(day)?,
                time_of_day(millis)?,
            ))
        }
        EncodingType::IPv6AddressAndHexScopeId => ipv6_address(payload)?,
        EncodingType::DateTimeInternal => date_time_internal(payload)?,
    };

    if enc.quotes {
        result = format!("\"{result}\"");
    }
    Ok(result)
}

fn special_value(payload: &str, encoding: &str) -> Option<String> {
    let count = || payload.trim().parse::<i64>().unwrap_or(0);
    let text = match encoding {
        "empty" => "<empty>".to_string(),
        "minimumitemcount" => format!("<at least {} items>", count()),
        "undefined" => "Undefined".to_string(),
        "null" => "Null".to_string(),
        "itemcount" => {
            let n = count();
            if n == 1 {
                "<1 item>".to_string()
            } else {
                format!("<{n} items>")
            }
        }
        "notaccessible" => "<not accessible>".to_string(),
        "optimizedout" => "<optimized out>".to_string(),
        "nullreference" => "<null reference>".to_string(),
        "emptystructure" => "{...}".to_string(),
        "uninitialized" => "<uninitialized>".to_string(),
        "invalid" => "<invalid>".to_string(),
        "notcallable" => "<not callable>".to_string(),
        "outofscope" => "<out of scope>".to_string(),
        _ => return None,
    };
    Some(text)
}

/// Non-printable characters are shown as `\` plus their hex code.
fn quote_unprintable_latin1(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ' ' || c.is_ascii_graphic() {
            out.push(c);
        } else {
            let _ = write!(out, "\\{:x}", u32::from(c));
        }
    }
    out
}

fn sized_payload(
    payload: &str,
    enc: DebuggerEncoding,
    encoding: &str,
) -> Result<Vec<u8>, DecodeError> {
    let valid = match enc.kind {
        EncodingType::HexEncodedFloat => matches!(enc.size, 4 | 8),
        _ => matches!(enc.size, 1 | 2 | 4 | 8),
    };
    if !valid {
        warn!(%encoding, "unsupported value size");
        return Err(DecodeError::UnsupportedEncoding(encoding.to_string()));
    }
    let mut bytes = decode_bytes(payload)?;
    if bytes.len() < enc.size {
        return Err(DecodeError::TruncatedPayload {
            expected: enc.size,
            actual: bytes.len(),
        });
    }
    bytes.truncate(enc.size);
    Ok(bytes)
}

fn unsigned_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &byte| acc << 8 | u64::from(byte))
}

fn signed_le(bytes: &[u8]) -> i64 {
    let bits = bytes.len() * 8;
    let raw = unsigned_le(bytes);
    if bits >= 64 {
        return i64::from_le_bytes(raw.to_le_bytes());
    }
    let shift = 64 - bits;
    i64::from_le_bytes((raw << shift).to_le_bytes()) >> shift
}

/// Reads an array of numbers from raw bytes, as sent for plot data.
pub fn read_numeric_vector(raw: &[u8], encoding: &DebuggerEncoding) -> Result<Vec<f64>, DecodeError> {
    let size = check_numeric(encoding)?;
    #[allow(clippy::cast_precision_loss)]
    let values = raw
        .chunks_exact(size)
        .map(|chunk| match (encoding.kind, size) {
            (EncodingType::HexEncodedFloat, 4) => {
                f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            }
            (EncodingType::HexEncodedFloat, _) => f64::from_le_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ]),
            (EncodingType::HexEncodedSignedInteger, _) => signed_le(chunk) as f64,
            _ => unsigned_le(chunk) as f64,
        })
        .collect();
    Ok(values)
}

/// Decodes the elements of an `arraydata` payload to display strings.
///
/// Integers keep their exact value; floats use the compact notation.
pub fn decode_array_elements(
    raw: &[u8],
    encoding: &DebuggerEncoding,
) -> Result<Vec<String>, DecodeError> {
    let size = check_numeric(encoding)?;
    let elements = raw
        .chunks_exact(size)
        .map(|chunk| match encoding.kind {
            EncodingType::HexEncodedSignedInteger => signed_le(chunk).to_string(),
            EncodingType::HexEncodedUnsignedInteger => unsigned_le(chunk).to_string(),
            _ if size == 4 => format_compact(
                f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
                6,
            ),
            _ => format_compact(
                f64::from_le_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
                ]),
                6,
            ),
        })
        .collect();
    Ok(elements)
}

fn check_numeric(encoding: &DebuggerEncoding) -> Result<usize, DecodeError> {
    let size = encoding.size;
    let supported = match encoding.kind {
        EncodingType::HexEncodedSignedInteger | EncodingType::HexEncodedUnsignedInteger => {
            matches!(size, 1 | 2 | 4 | 8)
        }
        EncodingType::HexEncodedFloat => matches!(size, 4 | 8),
        _ => false,
    };
    if supported {
        Ok(size)
    } else {
        warn!(encoding = %encoding, "unsupported numeric vector encoding");
        Err(DecodeError::UnsupportedEncoding(encoding.to_string()))
    }
}

fn julian_date(text: &str) -> Result<Date, DecodeError> {
    let invalid = || DecodeError::InvalidDateTime(text.to_string());
    let day: i32 = text.trim().parse().map_err(|_| invalid())?;
    if day == 0 {
        return Err(invalid());
    }
    Date::from_julian_day(day).map_err(|_| invalid())
}

fn time_of_day(text: &str) -> Result<Time, DecodeError> {
    let invalid = || DecodeError::InvalidDateTime(text.to_string());
    let millis: i64 = text.trim().parse().map_err(|_| invalid())?;
    if !(0..86_400_000).contains(&millis) {
        return Err(invalid());
    }
    Ok(Time::MIDNIGHT + Duration::milliseconds(millis))
}

fn date_time_internal(text: &str) -> Result<String, DecodeError> {
    let invalid = || DecodeError::InvalidDateTime(text.to_string());
    let mut fields = text.split('/');
    let millis: i64 = fields
        .next()
        .and_then(|field| field.trim().parse().ok())
        .ok_or_else(invalid)?;
    let time_spec: i32 = fields.next().and_then(|f| f.trim().parse().ok()).unwrap_or(0);
    let offset: i64 = fields.next().and_then(|f| f.trim().parse().ok()).unwrap_or(0);

    let utc = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|_| invalid())?;
    let (local, suffix) = match time_spec {
        // UTC
        1 => (utc, " GMT".to_string()),
        // Offset from UTC, in seconds.
        2 => {
            let sign = if offset < 0 { '-' } else { '+' };
            let minutes = offset.unsigned_abs() / 60;
            (
                utc + Duration::seconds(offset),
                format!(" GMT{sign}{:02}{:02}", minutes / 60, minutes % 60),
            )
        }
        // Local time and named zones are shown as UTC.
        _ => (utc, String::new()),
    };
    let stamp = PrimitiveDateTime::new(local.date(), local.time());
    Ok(format!("{}{suffix}", text_date_time(stamp)))
}

fn ipv6_address(text: &str) -> Result<String, DecodeError> {
    let invalid = || DecodeError::InvalidAddress(text.to_string());
    let (address, scope) = match text.split_once('%') {
        Some((address, scope)) => (address, Some(scope)),
        None => (text, None),
    };
    let address = if address.len() == 32 && !address.contains(':') {
        let bytes: [u8; 16] = decode_bytes(address)
            .map_err(|_| invalid())?
            .try_into()
            .map_err(|_| invalid())?;
        Ipv6Addr::from(bytes)
    } else {
        address.parse::<Ipv6Addr>().map_err(|_| invalid())?
    };
    let mut out = address.to_string();
    if let Some(scope) = scope {
        let units: Vec<u16> = decode_bytes_lenient(scope)
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if !units.is_empty() {
            out.push('%');
            out.push_str(&String::from_utf16_lossy(&units));
        }
    }
    Ok(out)
}

fn short_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

fn short_month(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// `Sat May 20 1995`
fn text_date(date: Date) -> String {
    format!(
        "{} {} {} {}",
        short_weekday(date.weekday()),
        short_month(date.month()),
        date.day(),
        date.year()
    )
}

/// `03:40:13`
fn text_time(time: Time) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )
}

/// `Sat May 20 03:40:13 1995`
fn text_date_time(stamp: PrimitiveDateTime) -> String {
    let date = stamp.date();
    format!(
        "{} {} {} {} {}",
        short_weekday(date.weekday()),
        short_month(date.month()),
        date.day(),
        text_time(stamp.time()),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::to_hex;

    #[test]
    fn parses_encoding_tags() {
        let enc = DebuggerEncoding::parse("utf16");
        assert_eq!(enc.kind, EncodingType::HexEncodedUtf16);
        assert_eq!(enc.size, 2);
        assert!(enc.quotes);

        let enc = DebuggerEncoding::parse("int:4:0");
        assert_eq!(enc.kind, EncodingType::HexEncodedSignedInteger);
        assert_eq!(enc.size, 4);
        assert!(!enc.quotes);
        assert_eq!(enc.to_string(), "int:4:0");

        assert_eq!(DebuggerEncoding::parse("bogus:3").kind, EncodingType::Unencoded);
    }

    #[test]
    fn decodes_strings() {
        assert_eq!(decode_data("", "").unwrap(), "");
        assert_eq!(decode_data("a\tb", "").unwrap(), "a\\9b");
        assert_eq!(decode_data(&to_hex("häh"), "utf8").unwrap(), "\"häh\"");
        assert_eq!(decode_data("e4", "latin1:1:0").unwrap(), "ä");
        assert_eq!(decode_data("68006900", "utf16:2:0").unwrap(), "hi");
        assert_eq!(decode_data("41000000", "ucs4:4:0").unwrap(), "A");
    }

    #[test]
    fn decodes_integers_little_endian() {
        assert_eq!(decode_data("ff", "int:1").unwrap(), "-1");
        assert_eq!(decode_data("ff", "uint:1").unwrap(), "255");
        assert_eq!(decode_data("feffffff", "int:4").unwrap(), "-2");
        assert_eq!(decode_data("0001", "uint:2").unwrap(), "256");
        assert_eq!(
            decode_data("ffffffffffffffff", "uint:8").unwrap(),
            "18446744073709551615"
        );
    }

    #[test]
    fn decodes_floats_most_significant_first() {
        assert_eq!(decode_data("3ff8000000000000", "float:8").unwrap(), "1.5");
        assert_eq!(decode_data("40490fdb", "float:4").unwrap(), "3.14159");
    }

    #[test]
    fn unsupported_combinations_are_errors() {
        assert_eq!(
            decode_data("00", "int:3"),
            Err(DecodeError::UnsupportedEncoding("int:3".to_string()))
        );
        assert_eq!(
            decode_data("0000", "float:2"),
            Err(DecodeError::UnsupportedEncoding("float:2".to_string()))
        );
        assert_eq!(
            decode_data("00", "int:4"),
            Err(DecodeError::TruncatedPayload {
                expected: 4,
                actual: 1
            })
        );
        assert!(matches!(
            decode_data("00", "nonsense"),
            Err(DecodeError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn special_placeholders() {
        assert_eq!(decode_data("", "optimizedout").unwrap(), "<optimized out>");
        assert_eq!(decode_data("3", "itemcount").unwrap(), "<3 items>");
        assert_eq!(decode_data("1", "itemcount").unwrap(), "<1 item>");
        assert_eq!(
            decode_data("100", "minimumitemcount").unwrap(),
            "<at least 100 items>"
        );
        assert_eq!(decode_data("", "emptystructure").unwrap(), "{...}");
        assert_eq!(decode_data("", "null").unwrap(), "Null");
    }

    #[test]
    fn dates_and_times() {
        assert_eq!(decode_data("2449858", "juliandate").unwrap(), "Sat May 20 1995");
        assert_eq!(
            decode_data("13213000", "millisecondssincemidnight").unwrap(),
            "03:40:13"
        );
        assert_eq!(
            decode_data("2449858/13213000", "juliandateandmillisecondssincemidnight").unwrap(),
            "Sat May 20 03:40:13 1995"
        );
        assert_eq!(
            decode_data("0/1/0//12", "datetimeinternal").unwrap(),
            "Thu Jan 1 00:00:00 1970 GMT"
        );
        assert_eq!(
            decode_data("0/2/3600//12", "datetimeinternal").unwrap(),
            "Thu Jan 1 01:00:00 1970 GMT+0100"
        );
        assert!(decode_data("0", "juliandate").is_err());
        assert!(decode_data("-5", "millisecondssincemidnight").is_err());
    }

    #[test]
    fn ipv6_with_scope() {
        assert_eq!(
            decode_data("fe80:0:0:0:0:0:0:1%6500740068003000", "ipv6addressandhexscopeid")
                .unwrap(),
            "fe80::1%eth0"
        );
        assert_eq!(
            decode_data("00000000000000000000000000000001", "ipv6addressandhexscopeid").unwrap(),
            "::1"
        );
        assert!(matches!(
            decode_data("not-an-address", "ipv6addressandhexscopeid"),
            Err(DecodeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn numeric_vectors() {
        let enc = DebuggerEncoding::parse("int:2");
        assert_eq!(
            read_numeric_vector(&[0xff, 0xff, 0x02, 0x00], &enc).unwrap(),
            vec![-1.0, 2.0]
        );
        let enc = DebuggerEncoding::parse("float:4");
        assert_eq!(
            read_numeric_vector(&1.5f32.to_le_bytes(), &enc).unwrap(),
            vec![1.5]
        );
        assert!(read_numeric_vector(&[0; 3], &DebuggerEncoding::parse("float:3")).is_err());
        assert!(read_numeric_vector(&[0; 3], &DebuggerEncoding::parse("utf8")).is_err());
    }

    #[test]
    fn array_elements() {
        let enc = DebuggerEncoding::parse("uint:1");
        assert_eq!(decode_array_elements(&[1, 255], &enc).unwrap(), ["1", "255"]);
        let enc = DebuggerEncoding::parse("int:8");
        assert_eq!(
            decode_array_elements(&i64::MIN.to_le_bytes(), &enc).unwrap(),
            [i64::MIN.to_string()]
        );
        let enc = DebuggerEncoding::parse("float:8");
        assert_eq!(decode_array_elements(&0.25f64.to_le_bytes(), &enc).unwrap(), ["0.25"]);
    }
}
