//! C-style numeric literals as printed by debugger backends, and printf-style
//! float rendering.

/// Parses an unsigned integer, picking the base from its prefix.
///
/// `0x`/`0X` selects hexadecimal, a leading `0` octal, anything else decimal.
/// Surrounding whitespace and a leading `+` are accepted.
#[must_use]
pub fn parse_unsigned(text: &str) -> Option<u64> {
    let text = text.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    if text.len() > 1 && text.starts_with('0') {
        return u64::from_str_radix(&text[1..], 8).ok();
    }
    text.parse().ok()
}

/// Parses a signed integer with the same base rules as [`parse_unsigned`].
#[must_use]
pub fn parse_signed(text: &str) -> Option<i64> {
    let text = text.trim();
    match text.strip_prefix('-') {
        Some(rest) => {
            let magnitude = parse_unsigned(rest)?;
            if magnitude == 1 << 63 {
                Some(i64::MIN)
            } else {
                i64::try_from(magnitude).ok().map(|value| -value)
            }
        }
        None => parse_unsigned(text).and_then(|value| i64::try_from(value).ok()),
    }
}

/// Formats like C's `%.{precision}e`: `1.500000e+00`.
#[must_use]
pub fn format_scientific(value: f64, precision: usize) -> String {
    if let Some(special) = non_finite(value) {
        return special;
    }
    let (mantissa, exponent) = split_scientific(value, precision);
    format!("{mantissa}e{}", exponent_suffix(exponent))
}

/// Formats like C's `%.{precision}g`: shortest of fixed and scientific
/// notation with trailing zeros removed.
#[must_use]
pub fn format_compact(value: f64, precision: usize) -> String {
    if let Some(special) = non_finite(value) {
        return special;
    }
    let precision = precision.max(1);
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let (mantissa, exponent) = split_scientific(value, precision - 1);
    let limit = i32::try_from(precision).unwrap_or(i32::MAX);
    if exponent < -4 || exponent >= limit {
        let mantissa = strip_fraction_zeros(&mantissa);
        return format!("{mantissa}e{}", exponent_suffix(exponent));
    }
    let decimals = usize::try_from(limit - 1 - exponent).unwrap_or(0);
    strip_fraction_zeros(&format!("{value:.decimals$}"))
}

fn non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("nan".to_string())
    } else if value.is_infinite() {
        Some(if value < 0.0 { "-inf" } else { "inf" }.to_string())
    } else {
        None
    }
}

fn split_scientific(value: f64, precision: usize) -> (String, i32) {
    let text = format!("{value:.precision$e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_string(), exponent.parse().unwrap_or(0)),
        None => (text, 0),
    }
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{sign}{:02}", exponent.unsigned_abs())
}

fn strip_fraction_zeros(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_base_from_prefix() {
        assert_eq!(parse_unsigned("0x1F"), Some(31));
        assert_eq!(parse_unsigned(" 017 "), Some(15));
        assert_eq!(parse_unsigned("0"), Some(0));
        assert_eq!(parse_unsigned("42"), Some(42));
        assert_eq!(parse_unsigned("09"), None);
        assert_eq!(parse_unsigned(""), None);
        assert_eq!(parse_unsigned("-1"), None);
    }

    #[test]
    fn signed_values() {
        assert_eq!(parse_signed("-0x10"), Some(-16));
        assert_eq!(parse_signed("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_signed("18446744073709551615"), None);
    }

    #[test]
    fn scientific_like_printf() {
        assert_eq!(format_scientific(1.5, 6), "1.500000e+00");
        assert_eq!(format_scientific(-0.000_123, 2), "-1.23e-04");
        assert_eq!(format_scientific(1e100, 1), "1.0e+100");
    }

    #[test]
    fn compact_like_printf() {
        assert_eq!(format_compact(3.141_592_65, 6), "3.14159");
        assert_eq!(format_compact(100.0, 6), "100");
        assert_eq!(format_compact(1_234_567.0, 6), "1.23457e+06");
        assert_eq!(format_compact(0.0001, 6), "0.0001");
        assert_eq!(format_compact(0.000_01, 6), "1e-05");
        assert_eq!(format_compact(2.5, 16), "2.5");
        assert_eq!(format_compact(f64::NAN, 6), "nan");
    }
}
