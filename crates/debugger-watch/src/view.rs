//! Query contract for a tree view over the watch tree.
//!
//! A view asks for cells by item handle, [`Column`] and [`ItemRole`]; edits
//! come back through [`WatchHandler::set_data`].

#![allow(missing_docs)]

use bitflags::bitflags;
use debugger_protocol::DisplayFormat;
use tracing::warn;

use crate::engine::{DebuggerEngine, EngineCapabilities, EngineState};
use crate::format::{
    display_name, display_type, display_value, integer_base, pointer_value, type_format_list,
};
use crate::handler::{WatchEvent, WatchHandler};
use crate::item::{EditType, EditValue, WantsChildren, WatchItem};
use crate::settings::SettingsStore;
use crate::tree::{ItemId, RootKind};
use crate::types::is_pointer_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Value,
    Type,
}

impl Column {
    pub const ALL: [Column; 3] = [Self::Name, Self::Value, Self::Type];

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Value => "Value",
            Self::Type => "Type",
        }
    }
}

/// What a view asks about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRole {
    Display,
    Edit,
    ToolTip,
    Foreground,
    EditType,
    Name,
    IntegerBase,
    Expression,
    RawExpression,
    IName,
    Expanded,
    TypeFormatList,
    /// Display type with namespaces removed.
    Type,
    RawType,
    TypeFormat,
    IndividualFormat,
    RawValue,
    ObjectAddress,
    PointerAddress,
    Size,
    IsWatchpointAtObjectAddress,
    IsWatchpointAtPointerAddress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Address(u64),
    Format(DisplayFormat),
    Formats(Vec<DisplayFormat>),
    EditType(EditType),
    Edit(EditValue),
    Color(ValueColor),
}

/// Foreground of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueColor {
    Normal,
    /// Stale or unavailable.
    Invalid,
    /// Differs from the value cache.
    Changed,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFlags: u8 {
        const SELECTABLE = 1 << 0;
        const ENABLED = 1 << 1;
        const EDITABLE = 1 << 2;
    }
}

const NOT_EDITABLE: ItemFlags = ItemFlags::SELECTABLE.union(ItemFlags::ENABLED);
const EDITABLE: ItemFlags = NOT_EDITABLE.union(ItemFlags::EDITABLE);

impl<E: DebuggerEngine, S: SettingsStore> WatchHandler<E, S> {
    /// Visible item at `id`; the invisible root is not one.
    fn view_item(&self, id: ItemId) -> Option<&WatchItem> {
        if id == self.tree.root() {
            return None;
        }
        self.tree.get(id)
    }

    fn is_stale(&self, item: &WatchItem) -> bool {
        !self.contents_valid && !item.is_inspect()
    }

    pub fn value_color(&self, item: &WatchItem, column: Column) -> ValueColor {
        if self.is_stale(item) {
            return ValueColor::Invalid;
        }
        if column != Column::Value {
            return ValueColor::Normal;
        }
        if !item.value_enabled || item.value.is_empty() {
            ValueColor::Invalid
        } else if self.value_cache.get(&item.iname) != Some(&item.value) {
            ValueColor::Changed
        } else {
            ValueColor::Normal
        }
    }

    /// Display formats offered for the item at `id`.
    pub fn type_format_list(&self, id: ItemId) -> Vec<DisplayFormat> {
        self.tree.get(id).map_or_else(Vec::new, |item| {
            type_format_list(item, |key| self.reported_formats.get(key).map(Vec::as_slice))
        })
    }

    /// Top-level watchers and return values, whose widths the name column
    /// should fit.
    pub fn column_width_items(&self) -> Vec<ItemId> {
        [RootKind::Watchers, RootKind::ReturnValue]
            .into_iter()
            .flat_map(|kind| self.tree.children(self.tree.category_root(kind)).to_vec())
            .collect()
    }

    pub fn data(&self, id: ItemId, column: Column, role: ItemRole) -> Option<RoleValue> {
        let item = self.view_item(id)?;
        let parent = self.parent_item(id);
        let ctx = self.format_context();
        let value = match role {
            ItemRole::EditType => RoleValue::EditType(item.edit_type()),
            ItemRole::Name => RoleValue::Text(item.name.clone()),
            ItemRole::IntegerBase => {
                let base = if is_pointer_type(&item.ty) {
                    16
                } else {
                    integer_base(self.prefs.effective_format(item))
                };
                RoleValue::Int(i64::from(base))
            }
            ItemRole::Edit => match column {
                Column::Name => RoleValue::Text(item.expression(parent)),
                Column::Value => RoleValue::Edit(item.edit_value(self.prefs.unprintable_base)),
                Column::Type => RoleValue::Text(item.ty.clone()),
            },
            ItemRole::Display => RoleValue::Text(match column {
                Column::Name => display_name(item, parent, &ctx),
                Column::Value => display_value(item, &ctx),
                Column::Type => display_type(item, &ctx),
            }),
            ItemRole::ToolTip => {
                if !self.config.use_tooltips_in_locals_view {
                    return None;
                }
                RoleValue::Text(item.tool_tip(&item.expression(parent)))
            }
            ItemRole::Foreground => RoleValue::Color(self.value_color(item, column)),
            ItemRole::Expression => RoleValue::Text(item.expression(parent)),
            ItemRole::RawExpression => RoleValue::Text(item.exp.clone()),
            ItemRole::IName => RoleValue::Text(item.iname.clone()),
            ItemRole::Expanded => RoleValue::Bool(self.is_expanded_iname(&item.iname)),
            ItemRole::TypeFormatList => RoleValue::Formats(self.type_format_list(id)),
            ItemRole::Type => RoleValue::Text(ctx.remove_namespaces(&display_type(item, &ctx))),
            ItemRole::RawType => RoleValue::Text(item.ty.clone()),
            ItemRole::TypeFormat => RoleValue::Format(self.prefs.type_format(&item.ty)),
            ItemRole::IndividualFormat => {
                RoleValue::Format(self.prefs.individual_format(&item.iname))
            }
            ItemRole::RawValue => RoleValue::Text(item.value.clone()),
            ItemRole::ObjectAddress => RoleValue::Address(item.address),
            ItemRole::PointerAddress => RoleValue::Address(item.origaddr),
            ItemRole::Size => RoleValue::Int(i64::from(item.size)),
            ItemRole::IsWatchpointAtObjectAddress => {
                RoleValue::Bool(self.engine.has_watchpoint_at(item.address))
            }
            ItemRole::IsWatchpointAtPointerAddress => RoleValue::Bool(
                is_pointer_type(&item.ty)
                    && self.engine.has_watchpoint_at(pointer_value(&item.value)),
            ),
        };
        Some(value)
    }

    /// Applies an edit from the view. Returns false when `id` is not a
    /// visible item or `value` does not fit `role`.
    pub fn set_data(&mut self, id: ItemId, column: Column, role: ItemRole, value: RoleValue) -> bool {
        let Some(item) = self.view_item(id) else {
            warn!(?id, "edit on missing item ignored");
            return false;
        };
        let iname = item.iname.clone();
        match (role, value) {
            (ItemRole::Edit, value) if column == Column::Name => {
                let text = match value {
                    RoleValue::Text(text) => text,
                    RoleValue::Bool(flag) => flag.to_string(),
                    RoleValue::Int(number) => number.to_string(),
                    RoleValue::Address(address) => format!("0x{address:x}"),
                    RoleValue::Edit(value) => value.to_string(),
                    other => {
                        warn!(%iname, ?other, "unsupported expression edit");
                        return false;
                    }
                };
                self.update_watch_expression(&iname, text.trim());
            }
            (ItemRole::Edit, value) => {
                let new_value = match value {
                    RoleValue::Edit(value) => value,
                    RoleValue::Text(text) => EditValue::Text(text),
                    RoleValue::Bool(flag) => EditValue::Bool(flag),
                    RoleValue::Int(number) => EditValue::Signed(number),
                    RoleValue::Address(address) => EditValue::Unsigned(address),
                    other => {
                        warn!(%iname, ?other, "unsupported edit value");
                        return false;
                    }
                };
                if let Some(item) = self.tree.get(id) {
                    let expression = item.expression(self.parent_item(id));
                    self.engine
                        .assign_value_in_debugger(item, &expression, &new_value);
                }
            }
            (ItemRole::Expanded, RoleValue::Bool(expanded)) => {
                if expanded {
                    self.expanded.insert(iname.as_str().into());
                } else {
                    self.expanded.shift_remove(iname.as_str());
                }
                if iname.contains('.') {
                    self.events.push(WatchEvent::ColumnAdjustmentRequested);
                }
            }
            (ItemRole::TypeFormat, RoleValue::Format(format)) => {
                let ty = self.tree.get(id).map(|item| item.ty.clone()).unwrap_or_default();
                self.set_type_format(&ty, format);
                self.engine.update_locals();
            }
            (ItemRole::IndividualFormat, RoleValue::Format(format)) => {
                self.set_individual_format(&iname, format);
                self.engine.update_locals();
            }
            (
                ItemRole::Expanded | ItemRole::TypeFormat | ItemRole::IndividualFormat,
                other,
            ) => {
                warn!(%iname, ?role, ?other, "value does not fit role");
                return false;
            }
            _ => {}
        }
        true
    }

    pub fn flags(&self, id: ItemId, column: Column) -> ItemFlags {
        if !self.tree.contains(id) {
            return ItemFlags::empty();
        }
        let Some(item) = self.view_item(id) else {
            return NOT_EDITABLE;
        };
        let state = self.engine.state();
        let blocked_while_running = state.is_running()
            && !self.engine.has_capability(EngineCapabilities::ADD_WATCHER_WHILE_RUNNING);
        let top_level = item.iname.matches('.').count() == 1;
        let value_editable = column == Column::Value && item.value_editable && item.elided == 0;
        let array_element = column == Column::Value && item.array_index.is_some();

        if item.is_watcher() {
            if state == EngineState::InferiorUnrunnable {
                return if column == Column::Name && top_level {
                    EDITABLE
                } else {
                    NOT_EDITABLE
                };
            }
            if blocked_while_running {
                return NOT_EDITABLE;
            }
            if column == Column::Name && top_level {
                return EDITABLE;
            }
            if array_element || (!item.name.is_empty() && value_editable) {
                return EDITABLE;
            }
        } else if item.is_local() {
            if state == EngineState::InferiorUnrunnable || blocked_while_running {
                return NOT_EDITABLE;
            }
            if value_editable || array_element {
                return EDITABLE;
            }
        } else if item.is_inspect() && column == Column::Value && item.value_editable {
            return EDITABLE;
        }
        NOT_EDITABLE
    }

    /// Whether expanding `id` should ask the engine for children.
    pub fn can_fetch_more(&self, id: ItemId) -> bool {
        self.view_item(id).is_some_and(|item| {
            item.wants_children == WantsChildren::Yes && !self.is_stale(item)
        })
    }

    pub fn has_children(&self, id: ItemId) -> bool {
        if self.view_item(id).is_none() {
            return true;
        }
        self.tree.child_count(id) > 0 || self.can_fetch_more(id)
    }

    /// View-side expansion of `id`, see [`WatchHandler::fetch_more`].
    pub fn fetch_more_at(&mut self, id: ItemId) {
        if let Some(iname) = self.view_item(id).map(|item| item.iname.clone()) {
            self.fetch_more(&iname);
        }
    }
}
