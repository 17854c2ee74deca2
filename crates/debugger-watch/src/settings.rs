//! Persisted session values.
//!
//! The watch layer stores four values between sessions: the watched
//! expressions, the per-type and per-item display formats, and the geometry
//! of the separated view. [`SettingsStore`] abstracts where they live.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SettingsError;

/// Key of the watched expression list.
pub const WATCHERS_KEY: &str = "Watchers";
/// Key of the per-type default formats.
pub const DEFAULT_FORMATS_KEY: &str = "DefaultFormats";
/// Key of the per-iname format overrides.
pub const INDIVIDUAL_FORMATS_KEY: &str = "IndividualFormats";
/// Key of the separated view geometry.
pub const SEPARATE_GEOMETRY_KEY: &str = "DebuggerSeparateWidgetGeometry";

/// Window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingValue {
    StringList(Vec<String>),
    IntMap(BTreeMap<String, i32>),
    Rect(Rect),
}

impl SettingValue {
    #[must_use]
    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(list) => Some(list),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int_map(&self) -> Option<&BTreeMap<String, i32>> {
        match self {
            Self::IntMap(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(rect) => Some(*rect),
            _ => None,
        }
    }
}

/// Storage for session values.
pub trait SettingsStore {
    fn value(&self, key: &str) -> Option<SettingValue>;
    fn set_value(&mut self, key: &str, value: SettingValue);
}

/// In-process settings, lost when dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySettings {
    values: BTreeMap<String, SettingValue>,
}

impl MemorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn value(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: SettingValue) {
        self.values.insert(key.to_string(), value);
    }
}

/// Settings kept in a TOML file.
///
/// Values are held in memory; [`TomlSettings::save`] writes them back.
#[derive(Debug, Clone)]
pub struct TomlSettings {
    path: PathBuf,
    values: BTreeMap<String, SettingValue>,
}

impl TomlSettings {
    /// Opens the settings file, starting empty when it does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file yet");
                BTreeMap::new()
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let text = toml::to_string(&self.values)?;
        std::fs::write(&self.path, text).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettings {
    fn value(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: SettingValue) {
        self.values.insert(key.to_string(), value);
    }
}
