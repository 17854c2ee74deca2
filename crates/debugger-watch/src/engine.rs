//! Backend engine facade used by the watch layer.

#![allow(missing_docs)]

use bitflags::bitflags;

use crate::item::{EditValue, WatchItem};

/// Lifecycle state of the debugged process as the engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    NotReady,
    SetupRequested,
    InferiorSetupRequested,
    InferiorRunRequested,
    InferiorRunOk,
    InferiorStopRequested,
    InferiorStopOk,
    /// Post-mortem sessions such as core files: inspectable, never runs.
    InferiorUnrunnable,
    ShutdownRequested,
    Finished,
}

impl EngineState {
    /// Whether the inferior may be executing, so values can change under us.
    #[must_use]
    pub fn is_running(self) -> bool {
        !matches!(
            self,
            Self::InferiorStopOk | Self::InferiorUnrunnable | Self::NotReady | Self::Finished
        )
    }
}

bitflags! {
    /// Optional engine features consulted by the watch layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EngineCapabilities: u32 {
        const ADD_WATCHER_WHILE_RUNNING = 1 << 0;
        const WATCHPOINT_BY_ADDRESS = 1 << 1;
        const SHOW_MEMORY = 1 << 2;
    }
}

/// Narrow interface the watch layer drives.
///
/// Requests are asynchronous: their results come back later as replies that
/// the host feeds to [`crate::WatchHandler::insert_items`].
pub trait DebuggerEngine {
    fn state(&self) -> EngineState;
    fn capabilities(&self) -> EngineCapabilities;
    /// Namespace the inferior's Qt was configured with, empty if none.
    fn qt_namespace(&self) -> &str;
    fn has_watchpoint_at(&self, address: u64) -> bool;

    fn update_locals(&mut self);
    fn update_all(&mut self);
    fn expand_item(&mut self, iname: &str);
    fn update_item(&mut self, iname: &str);
    fn update_watch_data(&mut self, iname: &str);
    fn assign_value_in_debugger(&mut self, item: &WatchItem, expression: &str, value: &EditValue);

    /// Diagnostic text for the debugger log.
    fn show_message(&mut self, message: &str) {
        let _ = message;
    }

    fn has_capability(&self, capability: EngineCapabilities) -> bool {
        self.capabilities().contains(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_states() {
        assert!(EngineState::InferiorRunOk.is_running());
        assert!(EngineState::InferiorStopRequested.is_running());
        assert!(!EngineState::InferiorStopOk.is_running());
        assert!(!EngineState::NotReady.is_running());
        assert!(!EngineState::InferiorUnrunnable.is_running());
    }
}
