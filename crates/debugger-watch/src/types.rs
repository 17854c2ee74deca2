//! Type-name classification and simplification.
//!
//! Type names arrive as the backend spells them (`std::__cxx11::basic_string<...>`,
//! `unsigned long int`, `Foo *`). These helpers classify them for formatting
//! and editing and shorten them for display.

const INT_TYPES: &[&str] = &[
    "bool",
    "char",
    "char8_t",
    "char16_t",
    "char32_t",
    "int",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "long",
    "long int",
    "long long",
    "long long int",
    "long long unsigned int",
    "long unsigned int",
    "ptrdiff_t",
    "qint8",
    "qint16",
    "qint32",
    "qint64",
    "qlonglong",
    "qptrdiff",
    "quint8",
    "quint16",
    "quint32",
    "quint64",
    "qulonglong",
    "short",
    "short int",
    "short unsigned int",
    "signed",
    "signed char",
    "signed int",
    "signed long",
    "signed long long",
    "signed short",
    "size_t",
    "std::ptrdiff_t",
    "std::size_t",
    "uchar",
    "uint",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
    "ulong",
    "unsigned",
    "unsigned char",
    "unsigned int",
    "unsigned long",
    "unsigned long int",
    "unsigned long long",
    "unsigned long long int",
    "unsigned short",
    "unsigned short int",
    "ushort",
    "wchar_t",
];

/// Whether `ty` names a built-in integral type (including `bool` and the
/// character types).
#[must_use]
pub fn is_int_type(ty: &str) -> bool {
    INT_TYPES.contains(&ty)
}

#[must_use]
pub fn is_float_type(ty: &str) -> bool {
    matches!(ty, "float" | "double" | "qreal" | "long double")
}

#[must_use]
pub fn is_pointer_type(ty: &str) -> bool {
    ty.ends_with('*') || ty.ends_with("* const")
}

/// Normalizes a reported type: drops `const`/`volatile` qualifiers and the
/// `class`/`struct` keywords the backend sometimes prefixes.
#[must_use]
pub fn normalize_type(ty: &str) -> String {
    let mut ty = ty.trim();
    loop {
        let next = if let Some(rest) = ty.strip_suffix("const") {
            rest
        } else if let Some(rest) = ty.strip_suffix(' ') {
            rest
        } else if let Some(rest) = ty.strip_prefix("const ") {
            rest
        } else if let Some(rest) = ty.strip_prefix("volatile ") {
            rest
        } else if let Some(rest) = ty.strip_prefix("class ") {
            rest
        } else if let Some(rest) = ty.strip_prefix("struct ") {
            rest
        } else if let Some(rest) = ty.strip_prefix(' ') {
            rest
        } else {
            break;
        };
        ty = next;
    }
    ty.to_string()
}

/// Key under which per-type formats are stored: the type name up to the
/// first template bracket, without blanks, reference markers or array extents.
#[must_use]
pub fn strip_for_format(ty: &str) -> String {
    let mut out = String::with_capacity(ty.len());
    let mut depth = 0_i32;
    for c in ty.chars() {
        match c {
            '<' => break,
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        if c == ' ' || c == '&' || (depth > 0 && c.is_ascii_digit()) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Shortens standard library spellings for display.
#[must_use]
pub fn simplify_type(ty: &str) -> String {
    let mut out = ty.replace("std::__1::", "std::").replace("std::__cxx11::", "std::");
    for (long, short) in [
        ("char", "std::string"),
        ("wchar_t", "std::wstring"),
        ("char16_t", "std::u16string"),
        ("char32_t", "std::u32string"),
    ] {
        for tail in [" >", ">"] {
            let spelled = format!(
                "std::basic_string<{long}, std::char_traits<{long}>, std::allocator<{long}>{tail}"
            );
            out = out.replace(&spelled, short);
        }
    }
    for defaulted in [", std::allocator<", ", std::less<"] {
        while let Some(start) = out.find(defaulted) {
            let open = start + defaulted.len() - 1;
            let Some(end) = matching_bracket(&out, open) else {
                break;
            };
            out.replace_range(start..=end, "");
        }
    }
    out.replace(" >", ">")
}

fn matching_bracket(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (index, c) in text[open..].char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + index);
                }
            }
            _ => {}
        }
    }
    None
}
