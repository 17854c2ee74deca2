//! Display format preferences.
//!
//! Formats are chosen per type (keyed by [`strip_for_format`]) or per item
//! (keyed by iname); an individual choice wins over the type default.

use std::collections::BTreeMap;

use debugger_protocol::DisplayFormat;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::item::WatchItem;
use crate::settings::{
    SettingValue, SettingsStore, DEFAULT_FORMATS_KEY, INDIVIDUAL_FORMATS_KEY,
};
use crate::types::strip_for_format;

/// How characters without a printable glyph are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnprintableBase {
    /// Shown as they are.
    Raw,
    /// `\n`, `\t`, `\r`, and `\ooo` octal for the rest.
    #[default]
    CEscapes,
    /// `\ooo` for every unprintable character.
    Octal,
    /// `\uXXXX` for every unprintable character.
    Unicode,
}

impl UnprintableBase {
    /// Maps the persisted base value: `0`, `-1`, `8`, anything else is hex.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Raw,
            -1 => Self::CEscapes,
            8 => Self::Octal,
            _ => Self::Unicode,
        }
    }

    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Raw => 0,
            Self::CEscapes => -1,
            Self::Octal => 8,
            Self::Unicode => 16,
        }
    }
}

/// Per-type and per-item format choices plus the unprintable base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatPreferences {
    type_formats: IndexMap<SmolStr, DisplayFormat>,
    individual_formats: IndexMap<SmolStr, DisplayFormat>,
    pub unprintable_base: UnprintableBase,
}

impl FormatPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type default for `ty`, `Automatic` when none is set.
    #[must_use]
    pub fn type_format(&self, ty: &str) -> DisplayFormat {
        self.type_formats
            .get(strip_for_format(ty).as_str())
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn individual_format(&self, iname: &str) -> DisplayFormat {
        self.individual_formats.get(iname).copied().unwrap_or_default()
    }

    /// Sets the default for every item of `ty`; `Automatic` removes it.
    pub fn set_type_format(&mut self, ty: &str, format: DisplayFormat) {
        let key = SmolStr::new(strip_for_format(ty));
        if format == DisplayFormat::Automatic {
            self.type_formats.shift_remove(&key);
        } else {
            self.type_formats.insert(key, format);
        }
    }

    /// Sets the format for one item; `Automatic` removes the override.
    pub fn set_individual_format(&mut self, iname: &str, format: DisplayFormat) {
        if format == DisplayFormat::Automatic {
            self.individual_formats.shift_remove(iname);
        } else {
            self.individual_formats.insert(SmolStr::new(iname), format);
        }
    }

    /// Individual override, else type default, else `Automatic`.
    #[must_use]
    pub fn effective_format(&self, item: &WatchItem) -> DisplayFormat {
        match self.individual_format(&item.iname) {
            DisplayFormat::Automatic => self.type_format(&item.ty),
            format => format,
        }
    }

    pub fn type_formats(&self) -> impl Iterator<Item = (&str, DisplayFormat)> {
        self.type_formats.iter().map(|(key, format)| (key.as_str(), *format))
    }

    pub fn individual_formats(&self) -> impl Iterator<Item = (&str, DisplayFormat)> {
        self.individual_formats
            .iter()
            .map(|(key, format)| (key.as_str(), *format))
    }

    /// Stores both format maps. Blank keys and automatic type defaults are
    /// not written.
    pub fn save(&self, settings: &mut dyn SettingsStore) {
        let defaults: BTreeMap<String, i32> = self
            .type_formats()
            .filter(|(key, format)| {
                *format != DisplayFormat::Automatic && !key.trim().is_empty()
            })
            .map(|(key, format)| (key.trim().to_string(), format.code()))
            .collect();
        settings.set_value(DEFAULT_FORMATS_KEY, SettingValue::IntMap(defaults));

        let individual: BTreeMap<String, i32> = self
            .individual_formats()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, format)| (key.trim().to_string(), format.code()))
            .collect();
        settings.set_value(INDIVIDUAL_FORMATS_KEY, SettingValue::IntMap(individual));
    }

    /// Adds the stored format maps, skipping blank keys.
    pub fn load(&mut self, settings: &dyn SettingsStore) {
        if let Some(value) = settings.value(DEFAULT_FORMATS_KEY) {
            for (key, code) in value.as_int_map().into_iter().flatten() {
                if !key.is_empty() {
                    self.type_formats
                        .insert(SmolStr::new(key), DisplayFormat::from_code(*code));
                }
            }
        }
        if let Some(value) = settings.value(INDIVIDUAL_FORMATS_KEY) {
            for (key, code) in value.as_int_map().into_iter().flatten() {
                if !key.is_empty() {
                    self.individual_formats
                        .insert(SmolStr::new(key), DisplayFormat::from_code(*code));
                }
            }
        }
        debug!(
            types = self.type_formats.len(),
            items = self.individual_formats.len(),
            "loaded display formats"
        );
    }
}
