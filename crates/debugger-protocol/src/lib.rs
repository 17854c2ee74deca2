//! `debugger-protocol` - Wire-level layer between a debugger front-end and its backend.
//!
//! This crate turns the textual output of a GDB/LLDB/CDB-style backend into typed
//! values and builds the requests sent back to it:
//!
//! - **Value parser**: recursive descent over the self-describing `GdbMi` value
//!   grammar (tuples, lists, named values, C strings)
//! - **Replies**: result-class classification and token correlation
//! - **Commands**: typed argument builders, behavioral flags and a token-keyed
//!   callback queue
//! - **Decoders**: hex payloads in the encodings produced by the dumper helpers
//!
//! # Design Principles
//!
//! - **Error-tolerant**: malformed or truncated backend output yields a partial
//!   tree, never a panic
//! - **Single pass**: the parser never backtracks
//! - **Typed failures**: undecodable payloads surface a [`DecodeError`]
//!
//! # Example
//!
//! ```
//! use debugger_protocol::{DebuggerResponse, ResultClass};
//!
//! let response = DebuggerResponse::parse("12^done,value=\"42\"");
//! assert_eq!(response.token, 12);
//! assert_eq!(response.result_class, ResultClass::Done);
//! assert_eq!(response.data.get("value").data(), "42");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod display_format;
pub mod encoding;
mod error;
pub mod hex;
pub mod mi;
pub mod number;
pub mod response;
pub mod version;

pub use command::{
    ArgValue, Callback, CommandFlags, CommandQueue, DebuggerCommand, DebuggerCommandSequence,
};
pub use display_format::DisplayFormat;
pub use encoding::{
    decode_array_elements, decode_data, read_numeric_vector, DebuggerEncoding, EncodingType,
};
pub use error::DecodeError;
pub use hex::{from_hex, to_hex};
pub use mi::{GdbMi, MiType};
pub use response::{DebuggerResponse, ReplyAssembler, ResultClass};
pub use version::GdbVersion;
