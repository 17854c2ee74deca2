//! `debugger-watch` - Locals and watchers model for a debugger front-end.
//!
//! Backend replies decoded by `debugger-protocol` are merged into a tree of
//! [`WatchItem`]s that a view queries cell by cell:
//!
//! - **Tree**: arena of items under five fixed roots (locals, inspector,
//!   watchers, return value, tooltip), keyed by hierarchical iname
//! - **Formatter**: integer bases, characters, floats, elision, truncation
//!   and namespace hiding, driven by per-type and per-item format choices
//! - **Handler**: update rounds with mark/insert/sweep staleness tracking,
//!   watcher registry, lazy child fetching and session persistence
//! - **Separated view**: decoding of image, string and plot payloads shown
//!   outside the tree
//!
//! # Example
//!
//! ```
//! use debugger_protocol::GdbMi;
//! use debugger_watch::{MemorySettings, WatchConfig, WatchHandler};
//! # use debugger_watch::{DebuggerEngine, EditValue, EngineCapabilities, EngineState, WatchItem};
//! # struct Engine;
//! # impl DebuggerEngine for Engine {
//! #     fn state(&self) -> EngineState { EngineState::InferiorStopOk }
//! #     fn capabilities(&self) -> EngineCapabilities { EngineCapabilities::empty() }
//! #     fn qt_namespace(&self) -> &str { "" }
//! #     fn has_watchpoint_at(&self, _: u64) -> bool { false }
//! #     fn update_locals(&mut self) {}
//! #     fn update_all(&mut self) {}
//! #     fn expand_item(&mut self, _: &str) {}
//! #     fn update_item(&mut self, _: &str) {}
//! #     fn update_watch_data(&mut self, _: &str) {}
//! #     fn assign_value_in_debugger(&mut self, _: &WatchItem, _: &str, _: &EditValue) {}
//! # }
//!
//! let mut handler = WatchHandler::new(Engine, MemorySettings::new(), WatchConfig::default());
//! handler.insert_items(&GdbMi::parse_multiple(r#"locals={name="x",value="5",type="int"}"#));
//! assert_eq!(handler.find_item("local.x").map(|item| item.value.as_str()), Some("5"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod engine;
mod error;
pub mod format;
mod handler;
pub mod item;
pub mod prefs;
pub mod separate;
pub mod settings;
pub mod timer;
pub mod tree;
pub mod types;
pub mod view;

pub use config::{ConfigRefresh, WatchConfig};
pub use engine::{DebuggerEngine, EngineCapabilities, EngineState};
pub use error::{ConfigError, EditValueError, SettingsError};
pub use format::FormatContext;
pub use handler::{TooltipRequest, WatchEvent, WatchHandler};
pub use item::{EditType, EditValue, ParsedItem, WantsChildren, WatchItem};
pub use prefs::{FormatPreferences, UnprintableBase};
pub use separate::{SeparatedContent, SeparatedView};
pub use settings::{MemorySettings, Rect, SettingValue, SettingsStore, TomlSettings};
pub use timer::UpdateTimer;
pub use tree::{Insertion, ItemId, RootKind, WatchTree};
pub use view::{Column, ItemFlags, ItemRole, RoleValue, ValueColor};
