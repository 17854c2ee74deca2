//! Outgoing backend requests.
//!
//! - `DebuggerCommand`: function name, JSON argument tree, flags and callback
//! - `DebuggerCommandSequence`: commands issued together, with continuation intent
//! - `CommandQueue`: token assignment and reply-to-callback dispatch

use std::fmt;
use std::path::Path;
use std::time::Instant;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::hex::to_hex;
use crate::response::{DebuggerResponse, ResultClass};

bitflags! {
    /// Behavioral flags of a command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandFlags: u32 {
        /// The inferior must be halted while the command runs and is resumed after.
        const NEEDS_TEMPORARY_STOP = 1;
        /// The reply may be dropped if superseded.
        const DISCARDABLE = 2;
        /// A trailing no-op is needed to flush output.
        const NEEDS_FLUSH = 4;
        /// The reply is classified `running`.
        const RUN_REQUEST = 16;
        /// The reply is classified `exit`.
        const EXIT_REQUEST = 32;
        /// The debuggee process handle becomes invalid.
        const LOSES_CHILD = 64;
        /// The inferior must be halted and stays halted.
        const NEEDS_FULL_STOP = 256;
        /// Wrapped for the backend's console interpreter.
        const CONSOLE_COMMAND = 512;
        /// Issued as part of a locals refresh round-trip.
        const IN_UPDATE_LOCALS = 1024;
        /// Not logged.
        const SILENT = 4096;
        /// Sent to the backend as-is.
        const NATIVE_COMMAND = 8192;
    }
}

/// Completion callback invoked with the matching reply.
pub type Callback = Box<dyn FnOnce(&DebuggerResponse)>;

/// Typed argument values accepted by [`DebuggerCommand::arg`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArgValue(Value);

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self(Value::Bool(value))
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        Self(Value::from(value))
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self(Value::from(value))
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        Self(Value::from(value))
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<&[i32]> for ArgValue {
    fn from(values: &[i32]) -> Self {
        Self(Value::Array(values.iter().copied().map(Value::from).collect()))
    }
}

impl From<Vec<i32>> for ArgValue {
    fn from(values: Vec<i32>) -> Self {
        Self::from(values.as_slice())
    }
}

/// String lists are hex-encoded element by element.
impl From<&[String]> for ArgValue {
    fn from(values: &[String]) -> Self {
        Self(Value::Array(
            values.iter().map(|value| Value::String(to_hex(value))).collect(),
        ))
    }
}

impl From<&[&str]> for ArgValue {
    fn from(values: &[&str]) -> Self {
        Self(Value::Array(
            values.iter().map(|value| Value::String(to_hex(value))).collect(),
        ))
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(values: Vec<String>) -> Self {
        Self::from(values.as_slice())
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&Path> for ArgValue {
    fn from(path: &Path) -> Self {
        Self(Value::String(path.to_string_lossy().into_owned()))
    }
}

/// One backend request.
pub struct DebuggerCommand {
    pub function: String,
    /// Either a JSON object of named arguments or an array of unnamed ones.
    pub args: Value,
    pub flags: CommandFlags,
    pub callback: Option<Callback>,
    /// Set when the command is posted.
    pub post_time: Option<Instant>,
}

impl fmt::Debug for DebuggerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebuggerCommand")
            .field("function", &self.function)
            .field("args", &self.args)
            .field("flags", &self.flags)
            .field("callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl DebuggerCommand {
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Value::Null,
            flags: CommandFlags::empty(),
            callback: None,
            post_time: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_callback(mut self, callback: impl FnOnce(&DebuggerResponse) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Adds a named argument.
    ///
    /// Arguments go into a JSON object; names must be plain identifiers.
    pub fn arg(&mut self, name: &str, value: impl Into<ArgValue>) {
        debug_assert!(is_plain_name(name), "invalid argument name {name:?}");
        debug_assert!(
            self.args.is_object() || self.args.is_null(),
            "named argument added to unnamed argument list"
        );
        if self.args.is_null() {
            self.args = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.args {
            map.insert(name.to_string(), value.into().0);
        }
    }

    /// Appends an unnamed string argument.
    pub fn push_arg(&mut self, value: &str) {
        debug_assert!(
            self.args.is_array() || self.args.is_null(),
            "unnamed argument added to named argument object"
        );
        if self.args.is_null() {
            self.args = Value::Array(Vec::new());
        }
        if let Value::Array(items) = &mut self.args {
            items.push(Value::String(value.to_string()));
        }
    }

    /// Arguments in a form a Python dumper can evaluate: nulls become `0`
    /// and booleans `0`/`1`.
    #[must_use]
    pub fn args_to_python(&self) -> String {
        if self.args.is_null() {
            return "{}".to_string();
        }
        to_python(&self.args).to_string()
    }

    /// Compact JSON form of the arguments.
    #[must_use]
    pub fn args_to_string(&self) -> String {
        match &self.args {
            Value::Null => String::new(),
            args => args.to_string(),
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.'))
}

fn to_python(value: &Value) -> Value {
    match value {
        Value::Null => Value::from(0_i32),
        Value::Bool(flag) => Value::from(i32::from(*flag)),
        Value::Array(items) => Value::Array(items.iter().map(to_python).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_python(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Commands that are issued together.
#[derive(Debug, Default)]
pub struct DebuggerCommandSequence {
    commands: Vec<DebuggerCommand>,
    continue_after: bool,
}

impl DebuggerCommandSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command. The continuation intent of the last append wins.
    pub fn append(&mut self, command: DebuggerCommand, want_continue: bool) {
        self.commands.push(command);
        self.continue_after = want_continue;
    }

    #[must_use]
    pub fn want_continue(&self) -> bool {
        self.continue_after
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn commands(&self) -> &[DebuggerCommand] {
        &self.commands
    }

    #[must_use]
    pub fn into_commands(self) -> Vec<DebuggerCommand> {
        self.commands
    }
}

struct PendingCommand {
    function: String,
    flags: CommandFlags,
    callback: Option<Callback>,
    post_time: Instant,
}

/// In-flight commands keyed by their correlation token.
pub struct CommandQueue {
    next_token: i32,
    pending: FxHashMap<i32, PendingCommand>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("next_token", &self.next_token)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_token: 1,
            pending: FxHashMap::default(),
        }
    }

    /// Registers `command` and returns the token its reply must carry.
    pub fn post(&mut self, mut command: DebuggerCommand) -> i32 {
        let token = self.next_token;
        self.next_token = self.next_token.checked_add(1).unwrap_or(1);
        let now = Instant::now();
        command.post_time = Some(now);
        if !command.flags.contains(CommandFlags::SILENT) {
            debug!(token, function = %command.function, args = %command.args_to_string(), "posting command");
        }
        let previous = self.pending.insert(
            token,
            PendingCommand {
                function: command.function,
                flags: command.flags,
                callback: command.callback,
                post_time: now,
            },
        );
        if previous.is_some() {
            warn!(token, "replaced a pending command with the same token");
        }
        token
    }

    /// Routes `response` to the callback registered for its token.
    ///
    /// Returns `false` when no command is waiting for that token.
    pub fn dispatch(&mut self, response: &DebuggerResponse) -> bool {
        let Some(command) = self.pending.remove(&response.token) else {
            debug!(token = response.token, "reply without pending command");
            return false;
        };
        let expected = if command.flags.contains(CommandFlags::RUN_REQUEST) {
            ResultClass::Running
        } else if command.flags.contains(CommandFlags::EXIT_REQUEST) {
            ResultClass::Exit
        } else {
            ResultClass::Done
        };
        if response.result_class != expected && response.result_class != ResultClass::Error {
            warn!(
                token = response.token,
                function = %command.function,
                expected = %expected,
                actual = %response.result_class,
                "unexpected result class"
            );
        }
        if !command.flags.contains(CommandFlags::SILENT) {
            debug!(
                token = response.token,
                function = %command.function,
                elapsed = ?command.post_time.elapsed(),
                "command finished"
            );
        }
        if let Some(callback) = command.callback {
            callback(response);
        }
        true
    }

    /// Drops pending discardable commands without running their callbacks.
    pub fn flush_discardable(&mut self) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, command| !command.flags.contains(CommandFlags::DISCARDABLE));
        before - self.pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, token: i32) -> bool {
        self.pending.contains_key(&token)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
