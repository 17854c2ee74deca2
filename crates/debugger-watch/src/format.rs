//! Value rendering.
//!
//! Pure functions from an item plus the format preferences to display text.
//! Nothing here touches the tree; callers pass the parent where a rule needs
//! it.

use std::fmt::Write as _;

use debugger_protocol::number::{format_compact, format_scientific, parse_unsigned};
use debugger_protocol::DisplayFormat;

use crate::item::WatchItem;
use crate::prefs::{FormatPreferences, UnprintableBase};
use crate::types::{is_pointer_type, simplify_type, strip_for_format};

/// Values longer than this are cut for display.
pub const MAX_DISPLAY_LENGTH: usize = 512;

/// Read-only inputs of the formatter.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub prefs: &'a FormatPreferences,
    pub show_std_namespace: bool,
    pub show_qt_namespace: bool,
    /// Namespace the inferior's Qt was built in, as reported by the engine.
    pub qt_namespace: &'a str,
}

impl FormatContext<'_> {
    /// Removes `std::` and the Qt namespace when they are configured hidden.
    #[must_use]
    pub fn remove_namespaces(&self, text: &str) -> String {
        let mut out = text.to_string();
        if !self.show_std_namespace {
            out = out.replace("std::", "");
        }
        if !self.show_qt_namespace && !self.qt_namespace.is_empty() {
            out = out.replace(self.qt_namespace, "");
        }
        out
    }
}

/// Numeric base matching an integer display format.
#[must_use]
pub fn integer_base(format: DisplayFormat) -> u32 {
    match format {
        DisplayFormat::HexadecimalInteger => 16,
        DisplayFormat::BinaryInteger => 2,
        DisplayFormat::OctalInteger => 8,
        _ => 10,
    }
}

/// Reinterprets `value` at `size` bytes (1, 2, 4, else 8) and prints it in
/// the base `format` asks for. Only decimal output can be negative.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn reformat_integer(value: u64, format: DisplayFormat, size: u32, signed: bool) -> String {
    let signed = signed
        && matches!(
            format,
            DisplayFormat::Automatic | DisplayFormat::DecimalInteger
        );
    let (value, signed_value) = match size {
        1 => (value & 0xff, i64::from(value as u8 as i8)),
        2 => (value & 0xffff, i64::from(value as u16 as i16)),
        4 => (value & 0xffff_ffff, i64::from(value as u32 as i32)),
        _ => (value, value as i64),
    };
    match format {
        DisplayFormat::HexadecimalInteger => format!("(hex) {value:x}"),
        DisplayFormat::BinaryInteger => format!("(bin) {value:b}"),
        DisplayFormat::OctalInteger => format!("(oct) {value:o}"),
        _ if signed => signed_value.to_string(),
        _ => value.to_string(),
    }
}

/// Renders a character code as quoted glyph, number and hex at `size` bytes.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn reformat_character(code: i32, size: u32, signed: bool) -> String {
    let glyph = char::from_u32(code as u32 & 0xffff).filter(|c| is_printable(*c));
    let mut out = match (glyph, code) {
        (Some(c), _) => format!("'{c}' "),
        (None, 0) => "'\\0'".to_string(),
        (None, 0x0d) => "'\\r'".to_string(),
        (None, 0x0a) => "'\\n'".to_string(),
        (None, 0x09) => "'\\t'".to_string(),
        _ => "    ".to_string(),
    };
    out.push('\t');

    let width = 2 + 2 * size as usize;
    if signed {
        let _ = write!(out, "{code}");
        if code < 0 {
            let wrapped = (1_i64 << (8 * size)) + i64::from(code);
            let suffix: String = format!("/{wrapped}    ").chars().take(width).collect();
            out.push_str(&suffix);
        } else {
            out.push_str(&" ".repeat(width));
        }
    } else {
        let _ = write!(out, "{}", code as u32);
    }
    out.push('\t');

    let mask = if size >= 8 {
        u64::MAX
    } else {
        (1_u64 << (8 * size)) - 1
    };
    let masked = u64::from(code as u32) & mask;
    let digits = 2 * size as usize;
    let _ = write!(out, "0x{masked:0digits$x}");
    out
}

/// Whether `c` has a visible glyph (letters, marks, numbers, punctuation,
/// symbols and spaces).
#[must_use]
pub fn is_printable(c: char) -> bool {
    !(c.is_control()
        || matches!(
            c,
            '\u{ad}'
                | '\u{600}'..='\u{605}'
                | '\u{200b}'..='\u{200f}'
                | '\u{2028}'..='\u{202e}'
                | '\u{2060}'..='\u{206f}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
                | '\u{fffe}'
                | '\u{ffff}'
        ))
}

/// Escapes characters without a glyph according to `base`.
#[must_use]
pub fn quote_unprintable(text: &str, base: UnprintableBase) -> String {
    if base == UnprintableBase::Raw {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if is_printable(c) {
            out.push(c);
            continue;
        }
        let code = u32::from(c);
        match (base, c) {
            (UnprintableBase::CEscapes, '\r') => out.push_str("\\r"),
            (UnprintableBase::CEscapes, '\t') => out.push_str("\\t"),
            (UnprintableBase::CEscapes, '\n') => out.push_str("\\n"),
            (UnprintableBase::CEscapes | UnprintableBase::Octal, _) => {
                let _ = write!(out, "\\{code:03o}");
            }
            _ => {
                let _ = write!(out, "\\u{code:04x}");
            }
        }
    }
    out
}

/// Caps `value` at [`MAX_DISPLAY_LENGTH`] characters, keeping the closing
/// quote of quoted values.
#[must_use]
pub fn truncate_value(value: &str) -> String {
    if value.chars().count() < MAX_DISPLAY_LENGTH {
        return value.to_string();
    }
    let quoted = value.ends_with('"');
    let mut out: String = value.chars().take(MAX_DISPLAY_LENGTH).collect();
    out.push_str(if quoted { "...\"" } else { "..." });
    out
}

/// Address part of a pointer value such as `0x00000000`000003fd class foo *`.
#[must_use]
pub fn pointer_value(value: &str) -> u64 {
    let head = value.split(' ').next().unwrap_or_default();
    parse_unsigned(&head.replace('`', "")).unwrap_or(0)
}

/// The item's value as shown in the value column, before truncation.
#[must_use]
pub fn formatted_value(item: &WatchItem, ctx: &FormatContext<'_>) -> String {
    let ty = item.ty.as_str();
    let value = item.value.as_str();
    if ty == "bool" {
        return match value {
            "0" => "false".to_string(),
            "1" => "true".to_string(),
            _ => value.to_string(),
        };
    }

    let format = ctx.prefs.effective_format(item);

    let code = value.trim().parse::<i32>().ok();
    if ty.ends_with("char") {
        if let Some(code) = code {
            let unsigned = ty == "unsigned char" || ty == "uchar";
            return reformat_character(code, 1, !unsigned);
        }
    } else if ty.ends_with("wchar_t") {
        if let Some(code) = code {
            return reformat_character(code, 4, false);
        }
    } else if ty.ends_with("QChar") {
        if let Some(code) = code {
            return reformat_character(code, 2, false);
        }
    }

    if format.is_integer() {
        let signed = value.starts_with('-');
        let raw = if signed {
            u64::from_ne_bytes(value.trim().parse::<i64>().unwrap_or(0).to_ne_bytes())
        } else {
            value.trim().parse::<u64>().unwrap_or(0)
        };
        return reformat_integer(raw, format, item.size, signed);
    }

    match format {
        DisplayFormat::ScientificFloat => {
            return format_scientific(value.trim().parse().unwrap_or(0.0), 6);
        }
        DisplayFormat::CompactFloat => {
            return format_compact(value.trim().parse().unwrap_or(0.0), 6);
        }
        _ => {}
    }

    if ty == "va_list" {
        return value.to_string();
    }

    if !is_pointer_type(ty) && !item.is_vtable_pointer() {
        if let Some(integer) = parse_unsigned(value) {
            return reformat_integer(integer, format, item.size, false);
        }
    }

    let base = ctx.prefs.unprintable_base;
    if item.elided != 0 {
        let mut chopped = value.chars();
        chopped.next_back();
        let length = if item.elided > 0 {
            item.elided.to_string()
        } else {
            "unknown length".to_string()
        };
        return format!(
            "{}\"... ({length})",
            quote_unprintable(chopped.as_str(), base)
        );
    }

    quote_unprintable(value, base)
}

/// Text of the name column.
#[must_use]
pub fn display_name(item: &WatchItem, parent: Option<&WatchItem>, ctx: &FormatContext<'_>) -> String {
    let Some(parent) = parent else {
        return String::new();
    };
    if let Some(index) = item.array_index {
        return format!("[{index}]");
    }
    let mut result = if item.iname.starts_with("return") && item.name.starts_with('$') {
        "returned value".to_string()
    } else if item.name == "*" {
        format!("*{}", parent.name)
    } else {
        ctx.remove_namespaces(&item.name)
    };

    // Base classes are reported as "[Base]".
    if result.starts_with('[') {
        result = simplify_type(&result);
        if result.chars().count() > 30 {
            result = result.chars().take(27).collect::<String>() + "...]";
        }
    }
    result
}

/// Text of the value column; addressable items without a value show their
/// address.
#[must_use]
pub fn display_value(item: &WatchItem, ctx: &FormatContext<'_>) -> String {
    let mut result = ctx.remove_namespaces(&truncate_value(&formatted_value(item, ctx)));
    if result.is_empty() && item.address != 0 {
        let _ = write!(result, "@0x{:x}", item.address);
    }
    result
}

/// Text of the type column.
#[must_use]
pub fn display_type(item: &WatchItem, ctx: &FormatContext<'_>) -> String {
    let mut result = simplify_type(&item.ty);
    if item.bitsize != 0 {
        let _ = write!(result, ":{}", item.bitsize);
    }
    ctx.remove_namespaces(&result.replace('\'', ""))
}

/// Formats offered for `item`, in menu order.
///
/// `reported` yields the dumper-provided formats for a type key.
#[must_use]
pub fn type_format_list<'r>(
    item: &WatchItem,
    reported: impl Fn(&str) -> Option<&'r [DisplayFormat]>,
) -> Vec<DisplayFormat> {
    use DisplayFormat as F;

    let mut key = strip_for_format(&item.ty);
    if let Some(pos) = key.find("::Q") {
        if key.matches(':').count() == 2 {
            key.replace_range(..pos + 2, "");
        }
    }
    if let Some(pos) = key.find('<') {
        key.truncate(pos);
    }
    let key = key.replace(':', "_");

    let mut formats: Vec<DisplayFormat> = reported(&key).map(<[_]>::to_vec).unwrap_or_default();
    if key.contains(']') {
        formats.push(DisplayFormat::ArrayPlot);
    }

    if item.origaddr != 0 || item.is_pointer() {
        formats.extend([
            F::Raw,
            F::Latin1String,
            F::SeparateLatin1String,
            F::Utf8String,
            F::SeparateUtf8String,
            F::Local8BitString,
            F::Utf16String,
            F::Ucs4String,
            F::Array10,
            F::Array100,
            F::Array1000,
            F::Array10000,
        ]);
    } else if item.ty.contains("char[") || item.ty.contains("char [") {
        formats.extend([
            F::Raw,
            F::Latin1String,
            F::SeparateLatin1String,
            F::Utf8String,
            F::SeparateUtf8String,
            F::Local8BitString,
            F::Utf16String,
            F::Ucs4String,
        ]);
    }

    let value = item.value.trim();
    if value.parse::<f64>().is_ok() {
        formats.extend([F::CompactFloat, F::ScientificFloat]);
    }

    let digits = value.strip_prefix('-').unwrap_or(value);
    let is_integer = digits.parse::<u64>().is_ok()
        || u64::from_str_radix(digits.strip_prefix("0x").unwrap_or(digits), 16).is_ok()
        || u64::from_str_radix(digits, 8).is_ok();
    if is_integer {
        formats.extend([
            F::DecimalInteger,
            F::HexadecimalInteger,
            F::BinaryInteger,
            F::OctalInteger,
        ]);
    }
    formats
}
