#![no_main]

use debugger_protocol::GdbMi;
use debugger_watch::{
    DebuggerEngine, EditValue, EngineCapabilities, EngineState, MemorySettings, WatchConfig,
    WatchHandler, WatchItem,
};
use libfuzzer_sys::fuzz_target;

const MAX_INPUT_BYTES: usize = 8192;

struct NullEngine;

impl DebuggerEngine for NullEngine {
    fn state(&self) -> EngineState {
        EngineState::InferiorStopOk
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities::all()
    }

    fn qt_namespace(&self) -> &str {
        ""
    }

    fn has_watchpoint_at(&self, _address: u64) -> bool {
        false
    }

    fn update_locals(&mut self) {}

    fn update_all(&mut self) {}

    fn expand_item(&mut self, _iname: &str) {}

    fn update_item(&mut self, _iname: &str) {}

    fn update_watch_data(&mut self, _iname: &str) {}

    fn assign_value_in_debugger(&mut self, _item: &WatchItem, _expression: &str, _value: &EditValue) {}
}

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_INPUT_BYTES)];
    let text = String::from_utf8_lossy(capped);

    let mut handler = WatchHandler::new(NullEngine, MemorySettings::new(), WatchConfig::default());
    handler.notify_update_started(&[]);
    handler.insert_items(&GdbMi::parse(&text));
    handler.notify_update_finished();
    let _ = handler.editor_contents(&[]);
});
