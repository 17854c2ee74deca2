//! The watch handler: owns the tree, the watcher registry and the format
//! preferences, and turns engine replies into tree updates.
//!
//! Update rounds follow a mark/insert/sweep protocol. [`WatchHandler::notify_update_started`]
//! flags the affected subtrees outdated, replies re-insert what is still in
//! scope, and [`WatchHandler::notify_update_finished`] destroys whatever was
//! not reported again.

#![allow(missing_docs)]

use std::time::Instant;

use debugger_protocol::{from_hex, to_hex, DebuggerCommand, DisplayFormat, GdbMi};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde_json::{json, Map, Value};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::config::{ConfigRefresh, WatchConfig};
use crate::engine::{DebuggerEngine, EngineState};
use crate::format::{display_value, FormatContext};
use crate::item::{ParsedItem, WantsChildren, WatchItem};
use crate::prefs::{FormatPreferences, UnprintableBase};
use crate::separate::SeparatedView;
use crate::settings::{SettingValue, SettingsStore, WATCHERS_KEY};
use crate::timer::UpdateTimer;
use crate::tree::{Insertion, ItemId, RootKind, WatchTree};
use crate::types::strip_for_format;

/// Notifications for the host, drained with [`WatchHandler::take_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The coalescing interval after an update start elapsed.
    UpdateStarted,
    UpdateFinished,
    /// A remembered expansion applies to an item present again.
    ItemExpanded(String),
    ColumnAdjustmentRequested,
    /// The watchers and return-value panes should be shown or hidden.
    WatchersWindow { show_watch: bool, show_return: bool },
    CurrentItem(String),
    LayoutChanged,
}

/// A pending tooltip evaluation sent along with the watcher requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipRequest {
    pub iname: String,
    pub expression: String,
}

/// Locals and watchers of one debugging session.
#[derive(Debug)]
pub struct WatchHandler<E, S> {
    pub(crate) engine: E,
    pub(crate) settings: S,
    pub(crate) config: WatchConfig,
    pub(crate) prefs: FormatPreferences,
    pub(crate) tree: WatchTree,
    watchers: IndexMap<SmolStr, u32>,
    watcher_count: u32,
    pub(crate) expanded: IndexSet<SmolStr>,
    pub(crate) reported_formats: FxHashMap<String, Vec<DisplayFormat>>,
    type_sizes: FxHashMap<String, u32>,
    pub(crate) value_cache: FxHashMap<String, String>,
    pub(crate) contents_valid: bool,
    reset_location_scheduled: bool,
    timer: UpdateTimer,
    separated: SeparatedView,
    pub(crate) events: Vec<WatchEvent>,
}

impl<E: DebuggerEngine, S: SettingsStore> WatchHandler<E, S> {
    pub fn new(engine: E, settings: S, config: WatchConfig) -> Self {
        let mut separated = SeparatedView::new();
        separated.restore_geometry(&settings);
        let mut prefs = FormatPreferences::new();
        prefs.unprintable_base = config.unprintable_base;
        Self {
            engine,
            settings,
            config,
            prefs,
            tree: WatchTree::new(),
            watchers: IndexMap::new(),
            watcher_count: 0,
            expanded: IndexSet::new(),
            reported_formats: FxHashMap::default(),
            type_sizes: FxHashMap::default(),
            value_cache: FxHashMap::default(),
            contents_valid: true,
            reset_location_scheduled: false,
            timer: UpdateTimer::default(),
            separated,
            events: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn tree(&self) -> &WatchTree {
        &self.tree
    }

    pub fn preferences(&self) -> &FormatPreferences {
        &self.prefs
    }

    pub fn separated_view(&self) -> &SeparatedView {
        &self.separated
    }

    /// Whether the last update round completed.
    pub fn contents_valid(&self) -> bool {
        self.contents_valid
    }

    pub fn find_item(&self, iname: &str) -> Option<&WatchItem> {
        self.tree.find(iname).and_then(|id| self.tree.get(id))
    }

    pub(crate) fn parent_item(&self, id: ItemId) -> Option<&WatchItem> {
        self.tree.parent(id).and_then(|parent| self.tree.get(parent))
    }

    /// Formatter inputs for the current configuration.
    pub fn format_context(&self) -> FormatContext<'_> {
        FormatContext {
            prefs: &self.prefs,
            show_std_namespace: self.config.show_std_namespace,
            show_qt_namespace: self.config.show_qt_namespace,
            qt_namespace: self.engine.qt_namespace(),
        }
    }

    /// Switches configuration and asks the engine for whatever must be
    /// fetched again.
    pub fn apply_config(&mut self, next: WatchConfig) {
        let refresh = self.config.refresh_needed(&next);
        let base = next.unprintable_base;
        let base_changed = self.config.unprintable_base != base;
        self.config = next;
        if base_changed {
            self.set_unprintable_base(base);
        }
        match refresh {
            ConfigRefresh::None => {}
            ConfigRefresh::Locals => self.engine.update_locals(),
            ConfigRefresh::All => self.engine.update_all(),
        }
    }

    /// Merges every child record of `data` into the tree.
    ///
    /// Direct children of a category root that were newly added get their
    /// siblings sorted by name once per batch.
    pub fn insert_items(&mut self, data: &GdbMi) {
        let sort_members = self.config.sort_struct_members;
        let mut to_sort: Vec<ItemId> = Vec::new();
        for child in data.children() {
            let mut parsed = ParsedItem::parse(child, sort_members);
            if parsed.item.size == 0 {
                if let Some(size) = self.type_sizes.get(&parsed.item.ty) {
                    parsed.item.size = *size;
                }
            }
            if let Insertion::Added(id) = self.insert_item(parsed) {
                if self.tree.level(id) == 2 {
                    if let Some(parent) = self.tree.parent(id) {
                        if !to_sort.contains(&parent) {
                            to_sort.push(parent);
                        }
                    }
                }
            }
        }
        for parent in to_sort {
            self.tree.sort_children_by_name(parent);
        }
    }

    /// Inserts one parsed item and refreshes the separated views of it and
    /// its children.
    pub fn insert_item(&mut self, parsed: ParsedItem) -> Insertion {
        if parsed.item.iname.is_empty() {
            warn!(name = %parsed.item.name, "item without iname not inserted");
            return Insertion::MissingParent;
        }
        let outcome = self.tree.insert(parsed);
        if let Some(id) = outcome.id() {
            let mut ids = vec![id];
            ids.extend(self.tree.descendants(id));
            for id in ids {
                if let Some(item) = self.tree.get(id) {
                    if let Err(err) = self.separated.show_edit_value(item, &mut self.settings) {
                        warn!(iname = %item.iname, %err, "cannot show separated value");
                    }
                }
            }
        }
        outcome
    }

    /// Starts an update round. An empty `inames` refreshes everything, else
    /// only the listed subtrees go stale.
    pub fn notify_update_started(&mut self, inames: &[&str]) {
        if inames.is_empty() {
            for kind in RootKind::ALL {
                self.tree.mark_outdated(self.tree.category_root(kind));
            }
        } else {
            for iname in inames {
                if let Some(id) = self.tree.find(iname) {
                    self.tree.mark_outdated(id);
                }
            }
        }
        self.timer.start(Instant::now());
        self.contents_valid = false;
        debug!(subtrees = inames.len(), "update started");
        self.update_watchers_window();
    }

    /// Ends an update round: drops what was not reported again and restores
    /// expansions.
    pub fn notify_update_finished(&mut self) {
        let removed = self.tree.sweep_outdated();

        let demoted: Vec<ItemId> = self
            .tree
            .items()
            .filter(|(id, item)| {
                item.wants_children == WantsChildren::Yes
                    && self.tree.child_count(*id) == 0
                    && self.expanded.contains(item.iname.as_str())
            })
            .map(|(id, _)| id)
            .collect();
        for id in demoted {
            if let Some(item) = self.tree.get_mut(id) {
                debug!(iname = %item.iname, "adjusting child expectation");
                item.wants_children = WantsChildren::No;
                let message = format!("ADJUSTING CHILD EXPECTATION FOR {}", item.iname);
                self.engine.show_message(&message);
            }
        }

        self.contents_valid = true;
        debug!(removed, "update finished");
        self.update_watchers_window();
        self.reexpand_items();
        self.timer.stop();
        self.events.push(WatchEvent::UpdateFinished);
    }

    /// Emits [`WatchEvent::UpdateStarted`] once the coalescing interval of
    /// the current round has elapsed. Returns whether it fired.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        let fired = self.timer.poll(now);
        if fired {
            self.events.push(WatchEvent::UpdateStarted);
        }
        fired
    }

    pub fn is_update_pending(&self) -> bool {
        self.timer.is_active()
    }

    pub fn take_events(&mut self) -> Vec<WatchEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn reexpand_items(&mut self) {
        for iname in &self.expanded {
            // Items missing from the current frame keep their expansion for
            // when they come back.
            if self.tree.find(iname).is_some() {
                self.events.push(WatchEvent::ItemExpanded(iname.to_string()));
            }
        }
    }

    /// Marks `iname` expanded and asks the engine for its children unless
    /// that request is already pending.
    pub fn fetch_more(&mut self, iname: &str) {
        let Some(id) = self.tree.find(iname) else {
            return;
        };
        let newly_expanded = self.expanded.insert(SmolStr::new(iname));
        if self.tree.child_count(id) > 0 {
            return;
        }
        let Some(item) = self.tree.get_mut(id) else {
            return;
        };
        if !newly_expanded && item.wants_children == WantsChildren::Yes {
            debug!(%iname, "children already requested");
            return;
        }
        item.wants_children = WantsChildren::Yes;
        self.engine.expand_item(iname);
    }

    pub fn is_expanded_iname(&self, iname: &str) -> bool {
        self.expanded.contains(iname)
    }

    pub fn expanded_inames(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(SmolStr::as_str)
    }

    /// Snapshot of the shown values; later differences are colored changed.
    pub fn reset_value_cache(&mut self) {
        self.value_cache = self
            .tree
            .items()
            .map(|(_, item)| (item.iname.clone(), item.value.clone()))
            .collect();
    }

    /// Empties the category roots; the inspector only when asked to.
    pub fn remove_all_data(&mut self, include_inspect_data: bool) {
        for kind in RootKind::ALL {
            if kind != RootKind::Inspector || include_inspect_data {
                self.tree.remove_children(self.tree.category_root(kind));
            }
        }
    }

    /// Session end: forgets expansions and data, keeps the watchers.
    pub fn cleanup(&mut self) {
        self.expanded.clear();
        self.watchers.shift_remove("");
        self.save_watchers();
        self.remove_all_data(false);
        self.events.push(WatchEvent::UpdateFinished);
        self.separated.clear();
    }

    /// Removes the item at `iname`. Removing the watchers root clears every
    /// watcher.
    pub fn remove_item_by_iname(&mut self, iname: &str) {
        let Some(id) = self.tree.find(iname) else {
            return;
        };
        if id == self.tree.category_root(RootKind::Watchers) {
            self.clear_watches();
            return;
        }
        if let Some(item) = self.tree.get(id) {
            if item.is_watcher() {
                let exp = item.exp.clone();
                self.watchers.shift_remove(exp.as_str());
                self.save_watchers();
            }
        }
        self.tree.remove(id);
        self.update_watchers_window();
    }

    fn watcher_iname(id: u32) -> String {
        format!("{}.{id}", RootKind::Watchers.iname())
    }

    /// Adds a watcher for `exp`, shown as `name` when given. Registering an
    /// expression twice does nothing.
    pub fn watch_expression(&mut self, exp: &str, name: &str) {
        if exp.is_empty() || self.watchers.contains_key(exp) {
            return;
        }
        let id = self.watcher_count;
        self.watcher_count += 1;
        self.watchers.insert(SmolStr::new(exp), id);

        let mut item = WatchItem::new(
            Self::watcher_iname(id),
            if name.is_empty() { exp } else { name },
        );
        item.exp = exp.to_string();
        let iname = item.iname.clone();
        let outcome = self.insert_item(ParsedItem {
            item,
            children: Vec::new(),
        });
        self.save_watchers();

        if self.engine.state() == EngineState::NotReady {
            if let Some(item) = outcome.id().and_then(|id| self.tree.get_mut(id)) {
                item.set_all_unneeded();
                item.set_value(" ");
            }
        } else {
            self.engine.update_watch_data(&iname);
        }
        self.update_watchers_window();
    }

    /// Points the watcher at `iname` to a new expression, keeping its id.
    pub fn update_watch_expression(&mut self, iname: &str, new_exp: &str) {
        if new_exp.is_empty() {
            return;
        }
        let Some(id) = self.tree.find(iname) else {
            warn!(%iname, "no watcher to update");
            return;
        };
        let Some(item) = self.tree.get_mut(id) else {
            return;
        };
        if item.exp != new_exp {
            let watcher_id = self.watchers.shift_remove(item.exp.as_str()).unwrap_or(0);
            self.watchers.insert(SmolStr::new(new_exp), watcher_id);
            item.exp = new_exp.to_string();
            item.name = new_exp.to_string();
        }

        self.save_watchers();
        if self.engine.state() == EngineState::NotReady {
            if let Some(item) = self.tree.get_mut(id) {
                item.set_all_unneeded();
                item.set_value(" ");
            }
        } else {
            self.engine.update_item(iname);
        }
        self.update_watchers_window();
    }

    /// Watches an expression picked in an editor, through the matching
    /// local when there is one.
    pub fn watch_variable(&mut self, exp: &str) {
        match self.find_cpp_local_variable(exp).map(|local| local.exp.clone()) {
            Some(local_exp) => self.watch_expression(&local_exp, exp),
            None => self.watch_expression(exp, ""),
        }
    }

    pub fn find_cpp_local_variable(&self, name: &str) -> Option<&WatchItem> {
        self.find_item(&format!("{}.{name}", RootKind::Locals.iname()))
    }

    /// Removes every watcher.
    pub fn clear_watches(&mut self) {
        if self.watchers.is_empty() {
            return;
        }
        self.tree
            .remove_children(self.tree.category_root(RootKind::Watchers));
        self.watchers.clear();
        self.watcher_count = 0;
        self.update_watchers_window();
        self.save_watchers();
    }

    /// Watched expressions in registration order, blanks skipped.
    pub fn watched_expressions(&self) -> Vec<String> {
        let mut watchers: Vec<(&SmolStr, u32)> =
            self.watchers.iter().map(|(exp, id)| (exp, *id)).collect();
        watchers.sort_by_key(|(_, id)| *id);
        watchers
            .into_iter()
            .filter(|(exp, _)| !exp.is_empty())
            .map(|(exp, _)| exp.to_string())
            .collect()
    }

    pub fn watcher_names(&self) -> impl Iterator<Item = (&str, u32)> {
        self.watchers.iter().map(|(exp, id)| (exp.as_str(), *id))
    }

    fn save_watchers(&mut self) {
        let list = self.watched_expressions();
        self.settings
            .set_value(WATCHERS_KEY, SettingValue::StringList(list));
    }

    pub fn save_session_data(&mut self) {
        self.save_watchers();
        self.prefs.save(&mut self.settings);
    }

    /// Restores formats and re-creates the stored watchers.
    pub fn load_session_data(&mut self) {
        self.prefs.load(&self.settings);
        self.watchers.clear();
        self.watcher_count = 0;
        self.tree
            .remove_children(self.tree.category_root(RootKind::Watchers));
        let stored = self
            .settings
            .value(WATCHERS_KEY)
            .and_then(|value| value.as_string_list().map(<[String]>::to_vec))
            .unwrap_or_default();
        for exp in stored {
            self.watch_expression(exp.trim(), "");
        }
    }

    pub fn reset_watchers(&mut self) {
        self.load_session_data();
    }

    fn update_watchers_window(&mut self) {
        self.events.push(WatchEvent::ColumnAdjustmentRequested);
        let show_return = self
            .tree
            .child_count(self.tree.category_root(RootKind::ReturnValue))
            != 0;
        self.events.push(WatchEvent::WatchersWindow {
            show_watch: !self.watchers.is_empty(),
            show_return,
        });
    }

    /// Effective format of the item at `iname`.
    pub fn format(&self, iname: &str) -> DisplayFormat {
        self.find_item(iname)
            .map(|item| self.prefs.effective_format(item))
            .unwrap_or_default()
    }

    /// Sets a per-type default, stores it and refreshes all values.
    pub fn set_type_format(&mut self, ty: &str, format: DisplayFormat) {
        self.prefs.set_type_format(ty, format);
        self.prefs.save(&mut self.settings);
        self.engine.update_all();
    }

    pub fn set_individual_format(&mut self, iname: &str, format: DisplayFormat) {
        self.prefs.set_individual_format(iname, format);
        self.prefs.save(&mut self.settings);
    }

    pub fn unprintable_base(&self) -> UnprintableBase {
        self.prefs.unprintable_base
    }

    pub fn set_unprintable_base(&mut self, base: UnprintableBase) {
        self.prefs.unprintable_base = base;
        self.events.push(WatchEvent::LayoutChanged);
    }

    /// `hex(type)=name` pairs for the type defaults a dumper can name.
    pub fn type_format_requests(&self) -> String {
        self.prefs
            .type_formats()
            .filter(|(_, format)| *format != DisplayFormat::Automatic)
            .map(|(ty, format)| format!("{}={}", to_hex(ty), format.request_name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `iname=name` pairs for the individual formats.
    pub fn individual_format_requests(&self) -> String {
        self.prefs
            .individual_formats()
            .filter(|(_, format)| *format != DisplayFormat::Automatic)
            .map(|(iname, format)| format!("{iname}={}", format.request_name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Adds `expanded`, `typeformats` and `formats` to a fetch command.
    pub fn append_format_requests(&self, cmd: &mut DebuggerCommand) {
        let expanded: Vec<Value> = self
            .expanded
            .iter()
            .map(|iname| Value::String(iname.to_string()))
            .collect();
        cmd.arg("expanded", Value::Array(expanded));

        cmd.arg(
            "typeformats",
            Value::Object(format_codes(self.prefs.type_formats())),
        );
        cmd.arg(
            "formats",
            Value::Object(format_codes(self.prefs.individual_formats())),
        );
    }

    /// Adds the pending tooltips and all watchers, with hex-encoded
    /// expressions, to a fetch command.
    pub fn append_watchers_and_tooltip_requests(
        &self,
        cmd: &mut DebuggerCommand,
        tooltips: &[TooltipRequest],
    ) {
        let mut watchers: Vec<Value> = tooltips
            .iter()
            .map(|tip| json!({ "iname": tip.iname, "exp": to_hex(&tip.expression) }))
            .collect();
        for exp in self.watched_expressions() {
            if let Some(id) = self.watchers.get(exp.as_str()) {
                watchers.push(json!({ "iname": Self::watcher_iname(*id), "exp": to_hex(&exp) }));
            }
        }
        cmd.arg("watchers", Value::Array(watchers));
    }

    /// Records the formats dumpers offer, from a `dumpers=[{type,formats}]`
    /// report.
    pub fn add_dumpers(&mut self, dumpers: &GdbMi) {
        for dumper in dumpers.children() {
            let mut formats = vec![DisplayFormat::Raw];
            formats.extend(
                dumper
                    .get("formats")
                    .data()
                    .split(',')
                    .filter_map(|code| code.trim().parse::<i32>().ok())
                    .filter(|code| *code != 0)
                    .map(DisplayFormat::from_code),
            );
            self.add_type_formats(dumper.get("type").data(), formats);
        }
    }

    pub fn add_type_formats(&mut self, ty: &str, formats: Vec<DisplayFormat>) {
        self.reported_formats.insert(strip_for_format(ty), formats);
    }

    /// Records type sizes from a `typeinfo=[{name,size}]` report; names are
    /// hex-encoded.
    pub fn record_type_info(&mut self, type_info: &GdbMi) {
        if !type_info.is_list() {
            return;
        }
        for entry in type_info.children() {
            let name = from_hex(entry.get("name").data());
            let size = entry.get("size").data().trim().parse().unwrap_or(0);
            self.type_sizes.insert(name, size);
        }
    }

    /// Tab-separated dump of the selected items, or of all when `selection`
    /// is empty, indented by depth.
    pub fn editor_contents(&self, selection: &[ItemId]) -> String {
        let ctx = self.format_context();
        let mut contents = String::new();
        for (id, item) in self.tree.items() {
            if selection.is_empty() || selection.contains(&id) {
                contents.push_str(&"\t".repeat(self.tree.level(id)));
                contents.push_str(&item.name);
                contents.push('\t');
                contents.push_str(&display_value(item, &ctx));
                contents.push('\t');
                contents.push_str(&item.ty);
                contents.push('\n');
            }
        }
        contents
    }

    /// Values go stale until the next location change is processed.
    pub fn schedule_reset_location(&mut self) {
        self.contents_valid = false;
        self.reset_location_scheduled = true;
    }

    pub fn reset_location(&mut self) {
        self.reset_location_scheduled = false;
    }

    pub fn is_reset_location_scheduled(&self) -> bool {
        self.reset_location_scheduled
    }

    pub fn set_current_item(&mut self, iname: &str) {
        if self.tree.find(iname).is_some() {
            self.events.push(WatchEvent::CurrentItem(iname.to_string()));
        }
    }

    /// Closes a separated tab and drops the individual format that opened
    /// it.
    pub fn close_separated_tab(&mut self, index: usize) {
        if let Some(iname) = self.separated.close_tab(index, &mut self.settings) {
            self.set_individual_format(&iname, DisplayFormat::Automatic);
        }
    }
}

fn format_codes<'a>(formats: impl Iterator<Item = (&'a str, DisplayFormat)>) -> Map<String, Value> {
    formats
        .filter(|(_, format)| *format != DisplayFormat::Automatic)
        .map(|(key, format)| (key.to_string(), Value::from(format.code())))
        .collect()
}
