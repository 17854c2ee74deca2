//! Watch view configuration (`watch.toml`).
//!
//! ```toml
//! [watch]
//! sort_struct_members = true
//! show_std_namespace = false
//! unprintable_base = 16
//! ```

#![allow(missing_docs)]

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::prefs::UnprintableBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub sort_struct_members: bool,
    pub show_std_namespace: bool,
    pub show_qt_namespace: bool,
    pub show_qobject_names: bool,
    pub use_tooltips_in_locals_view: bool,
    pub unprintable_base: UnprintableBase,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sort_struct_members: true,
            show_std_namespace: true,
            show_qt_namespace: true,
            show_qobject_names: false,
            use_tooltips_in_locals_view: false,
            unprintable_base: UnprintableBase::CEscapes,
        }
    }
}

/// Engine refresh a configuration change calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigRefresh {
    None,
    Locals,
    All,
}

impl WatchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: WatchToml = toml::from_str(text)?;
        raw.into_config()
    }

    /// What the engine must re-fetch after switching from `self` to `next`.
    #[must_use]
    pub fn refresh_needed(&self, next: &Self) -> ConfigRefresh {
        if self.show_std_namespace != next.show_std_namespace
            || self.show_qt_namespace != next.show_qt_namespace
            || self.show_qobject_names != next.show_qobject_names
        {
            ConfigRefresh::All
        } else if self.sort_struct_members != next.sort_struct_members {
            ConfigRefresh::Locals
        } else {
            ConfigRefresh::None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WatchToml {
    watch: Option<WatchSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WatchSection {
    sort_struct_members: Option<bool>,
    show_std_namespace: Option<bool>,
    show_qt_namespace: Option<bool>,
    show_qobject_names: Option<bool>,
    use_tooltips_in_locals_view: Option<bool>,
    unprintable_base: Option<i32>,
}

impl WatchToml {
    fn into_config(self) -> Result<WatchConfig, ConfigError> {
        let defaults = WatchConfig::default();
        let section = self.watch.unwrap_or_default();
        let unprintable_base = match section.unprintable_base {
            None => defaults.unprintable_base,
            Some(code @ (0 | -1 | 8 | 16)) => UnprintableBase::from_code(code),
            Some(code) => return Err(ConfigError::UnprintableBase(code)),
        };
        Ok(WatchConfig {
            sort_struct_members: section
                .sort_struct_members
                .unwrap_or(defaults.sort_struct_members),
            show_std_namespace: section
                .show_std_namespace
                .unwrap_or(defaults.show_std_namespace),
            show_qt_namespace: section
                .show_qt_namespace
                .unwrap_or(defaults.show_qt_namespace),
            show_qobject_names: section
                .show_qobject_names
                .unwrap_or(defaults.show_qobject_names),
            use_tooltips_in_locals_view: section
                .use_tooltips_in_locals_view
                .unwrap_or(defaults.use_tooltips_in_locals_view),
            unprintable_base,
        })
    }
}
