//! Value display formats.
//!
//! The numeric codes are persisted in user settings and exchanged with the
//! dumper helpers. New formats are only ever appended.

#![allow(missing_docs)]

/// A display format request for one value or one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(i32)]
pub enum DisplayFormat {
    /// Based on type for individuals, dumper default for types.
    #[default]
    Automatic = 0,
    Raw = 1,
    Simple = 2,
    Enhanced = 3,
    Separate = 4,

    Latin1String = 5,
    SeparateLatin1String = 6,
    Utf8String = 7,
    SeparateUtf8String = 8,
    Local8BitString = 9,
    Utf16String = 10,
    Ucs4String = 11,

    Array10 = 12,
    Array100 = 13,
    Array1000 = 14,
    Array10000 = 15,
    ArrayPlot = 16,

    CompactMap = 17,
    DirectQListStorage = 18,
    IndirectQListStorage = 19,

    BoolText = 20,
    BoolInteger = 21,

    DecimalInteger = 22,
    HexadecimalInteger = 23,
    BinaryInteger = 24,
    OctalInteger = 25,

    CompactFloat = 26,
    ScientificFloat = 27,
}

/// Marker strings a dumper sends back in `editformat` for out-of-line views.
pub const DISPLAY_LATIN1_STRING: &str = "latin1:separate";
pub const DISPLAY_UTF8_STRING: &str = "utf8:separate";
pub const DISPLAY_UTF16_STRING: &str = "utf16:separate";
pub const DISPLAY_UCS4_STRING: &str = "ucs4:separate";
pub const DISPLAY_IMAGE_DATA: &str = "imagedata:separate";
pub const DISPLAY_IMAGE_FILE: &str = "imagefile:separate";
pub const DISPLAY_PLOT_DATA: &str = "plotdata:separate";
pub const DISPLAY_ARRAY_DATA: &str = "arraydata:separate";

impl DisplayFormat {
    /// All formats in code order.
    pub const ALL: [DisplayFormat; 28] = [
        Self::Automatic,
        Self::Raw,
        Self::Simple,
        Self::Enhanced,
        Self::Separate,
        Self::Latin1String,
        Self::SeparateLatin1String,
        Self::Utf8String,
        Self::SeparateUtf8String,
        Self::Local8BitString,
        Self::Utf16String,
        Self::Ucs4String,
        Self::Array10,
        Self::Array100,
        Self::Array1000,
        Self::Array10000,
        Self::ArrayPlot,
        Self::CompactMap,
        Self::DirectQListStorage,
        Self::IndirectQListStorage,
        Self::BoolText,
        Self::BoolInteger,
        Self::DecimalInteger,
        Self::HexadecimalInteger,
        Self::BinaryInteger,
        Self::OctalInteger,
        Self::CompactFloat,
        Self::ScientificFloat,
    ];

    /// Persisted numeric code.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps a persisted code back, degrading unknown codes to `Automatic`.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or_default()
    }

    /// User-facing label.
    #[must_use]
    pub fn name(self) -> String {
        let text = match self {
            Self::Automatic => "Automatic",
            Self::Raw => "Raw Data",
            Self::Simple => "Normal",
            Self::Enhanced => "Enhanced",
            Self::Separate => "Separate Window",
            Self::Latin1String => "Latin1 String",
            Self::SeparateLatin1String => "Latin1 String in Separate Window",
            Self::Utf8String => "UTF-8 String",
            Self::SeparateUtf8String => "UTF-8 String in Separate Window",
            Self::Local8BitString => "Local 8-Bit String",
            Self::Utf16String => "UTF-16 String",
            Self::Ucs4String => "UCS-4 String",
            Self::Array10 => return array_name(10),
            Self::Array100 => return array_name(100),
            Self::Array1000 => return array_name(1000),
            Self::Array10000 => return array_name(10000),
            Self::ArrayPlot => "Plot in Separate Window",
            Self::CompactMap => "Display Keys and Values Side by Side",
            Self::DirectQListStorage => "Force Display as Direct Storage Form",
            Self::IndirectQListStorage => "Force Display as Indirect Storage Form",
            Self::BoolText => "Display Boolean Values as True or False",
            Self::BoolInteger => "Display Boolean Values as 1 or 0",
            Self::DecimalInteger => "Decimal Integer",
            Self::HexadecimalInteger => "Hexadecimal Integer",
            Self::BinaryInteger => "Binary Integer",
            Self::OctalInteger => "Octal Integer",
            Self::CompactFloat => "Compact Float",
            Self::ScientificFloat => "Scientific Float",
        };
        text.to_string()
    }

    /// Short name used in dumper format requests, empty if the dumper has
    /// no textual form for it.
    #[must_use]
    pub fn request_name(self) -> &'static str {
        match self {
            Self::Latin1String => "latin",
            Self::SeparateLatin1String => "latin:separate",
            Self::Utf8String => "utf8",
            Self::SeparateUtf8String => "utf8:separate",
            Self::Utf16String => "utf16",
            _ => "",
        }
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::DecimalInteger
                | Self::HexadecimalInteger
                | Self::BinaryInteger
                | Self::OctalInteger
        )
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::CompactFloat | Self::ScientificFloat)
    }
}

fn array_name(count: u32) -> String {
    format!("Array of {count} items")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        for (index, format) in DisplayFormat::ALL.iter().enumerate() {
            assert_eq!(format.code(), i32::try_from(index).unwrap());
            assert_eq!(DisplayFormat::from_code(format.code()), *format);
        }
        assert_eq!(DisplayFormat::HexadecimalInteger.code(), 23);
        assert_eq!(DisplayFormat::ScientificFloat.code(), 27);
    }

    #[test]
    fn unknown_code_is_automatic() {
        assert_eq!(DisplayFormat::from_code(-1), DisplayFormat::Automatic);
        assert_eq!(DisplayFormat::from_code(28), DisplayFormat::Automatic);
    }

    #[test]
    fn names() {
        assert_eq!(DisplayFormat::Array100.name(), "Array of 100 items");
        assert_eq!(DisplayFormat::Raw.name(), "Raw Data");
        assert_eq!(DisplayFormat::SeparateUtf8String.request_name(), "utf8:separate");
        assert_eq!(DisplayFormat::Ucs4String.request_name(), "");
    }
}
