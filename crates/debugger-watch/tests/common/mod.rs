#![allow(dead_code)]

use std::fmt::Write as _;

use debugger_watch::{
    DebuggerEngine, EditValue, EngineCapabilities, EngineState, MemorySettings, WatchConfig,
    WatchHandler, WatchItem,
};

/// Routes library diagnostics to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .with_test_writer()
        .try_init();
}

/// Engine double that records every request it receives.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub state: EngineState,
    pub capabilities: EngineCapabilities,
    pub qt_namespace: String,
    pub watchpoints: Vec<u64>,
    pub calls: Vec<String>,
    pub messages: Vec<String>,
}

impl RecordingEngine {
    pub fn stopped() -> Self {
        Self {
            state: EngineState::InferiorStopOk,
            ..Self::default()
        }
    }

    pub fn take_calls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.calls)
    }
}

impl DebuggerEngine for RecordingEngine {
    fn state(&self) -> EngineState {
        self.state
    }

    fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    fn qt_namespace(&self) -> &str {
        &self.qt_namespace
    }

    fn has_watchpoint_at(&self, address: u64) -> bool {
        self.watchpoints.contains(&address)
    }

    fn update_locals(&mut self) {
        self.calls.push("update_locals".to_string());
    }

    fn update_all(&mut self) {
        self.calls.push("update_all".to_string());
    }

    fn expand_item(&mut self, iname: &str) {
        self.calls.push(format!("expand_item {iname}"));
    }

    fn update_item(&mut self, iname: &str) {
        self.calls.push(format!("update_item {iname}"));
    }

    fn update_watch_data(&mut self, iname: &str) {
        self.calls.push(format!("update_watch_data {iname}"));
    }

    fn assign_value_in_debugger(&mut self, item: &WatchItem, expression: &str, value: &EditValue) {
        self.calls
            .push(format!("assign {} {expression} {value:?}", item.iname));
    }

    fn show_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

pub type TestHandler = WatchHandler<RecordingEngine, MemorySettings>;

/// Handler over a stopped inferior with default configuration.
pub fn handler() -> TestHandler {
    init_tracing();
    WatchHandler::new(
        RecordingEngine::stopped(),
        MemorySettings::new(),
        WatchConfig::default(),
    )
}

/// One line per item below the category roots: `iname name = value [type]`,
/// indented by depth.
pub fn dump_tree(handler: &TestHandler) -> String {
    let tree = handler.tree();
    let mut out = String::new();
    for (id, item) in tree.items() {
        if tree.is_category_root(id) {
            continue;
        }
        let indent = "  ".repeat(tree.level(id).saturating_sub(2));
        let _ = writeln!(
            out,
            "{indent}{} {} = {} [{}]",
            item.iname, item.name, item.value, item.ty
        );
    }
    out
}
