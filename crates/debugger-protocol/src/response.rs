//! Backend replies.
//!
//! - `ResultClass`: classification of a result record
//! - `DebuggerResponse`: one classified reply with its correlation token
//! - `ReplyAssembler`: joins stream records with the result record they precede

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::mi::GdbMi;

/// Result class of a reply record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultClass {
    /// Unrecognized class word.
    #[default]
    Unknown,
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

impl ResultClass {
    /// Canonical spelling, as sent by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Running => "running",
            Self::Connected => "connected",
            Self::Error => "error",
            Self::Exit => "exit",
            Self::Unknown => "unknown",
        }
    }

    /// Classifies a class word; anything unrecognized is `Unknown`.
    #[must_use]
    pub fn classify(word: &str) -> Self {
        match word {
            "done" => Self::Done,
            "running" => Self::Running,
            "connected" => Self::Connected,
            "error" => Self::Error,
            "exit" => Self::Exit,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ResultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::classify(s))
    }
}

/// One classified backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerResponse {
    /// Correlation token, `-1` when the reply carried none.
    pub token: i32,
    pub result_class: ResultClass,
    /// Result payload as a synthetic list of the record's results.
    pub data: GdbMi,
    pub log_stream_output: String,
    pub console_stream_output: String,
}

impl Default for DebuggerResponse {
    fn default() -> Self {
        Self {
            token: -1,
            result_class: ResultClass::Unknown,
            data: GdbMi::default(),
            log_stream_output: String::new(),
            console_stream_output: String::new(),
        }
    }
}

impl DebuggerResponse {
    /// Parses a result record: `[token][^]class[,result]*`.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let digits = line.bytes().take_while(u8::is_ascii_digit).count();
        let token = if digits == 0 {
            -1
        } else {
            line[..digits].parse().unwrap_or(-1)
        };
        let rest = &line[digits..];
        let rest = rest
            .strip_prefix(['^', '*', '='])
            .unwrap_or(rest);
        let (class, results) = rest.split_once(',').unwrap_or((rest, ""));
        let result_class = ResultClass::classify(class.trim());
        if result_class == ResultClass::Unknown {
            debug!(%class, "unknown result class");
        }
        Self {
            token,
            result_class,
            data: GdbMi::parse_multiple(results),
            ..Self::default()
        }
    }

    /// Human-readable dump for logs.
    #[must_use]
    pub fn to_debug_string(&self) -> String {
        let mut out = String::new();
        if self.token != -1 {
            out.push_str(&self.token.to_string());
        }
        out.push('^');
        out.push_str(self.result_class.as_str());
        for child in self.data.children() {
            out.push(',');
            out.push_str(&child.to_string_repr(false));
        }
        out
    }
}

/// Stream record kinds preceding a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Console,
    Log,
    Target,
}

/// Collects stream output until the result record that terminates it.
#[derive(Debug, Default)]
pub struct ReplyAssembler {
    console: String,
    log: String,
}

impl ReplyAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line of backend output.
    ///
    /// Returns a response when `line` is a result record; stream records are
    /// buffered and attached to that response.
    pub fn feed(&mut self, line: &str) -> Option<DebuggerResponse> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with("(gdb)") {
            return None;
        }
        let stream = match line.as_bytes()[0] {
            b'~' => Some(StreamKind::Console),
            b'&' => Some(StreamKind::Log),
            b'@' => Some(StreamKind::Target),
            _ => None,
        };
        if let Some(kind) = stream {
            let text = GdbMi::parse(&line[1..]);
            match kind {
                StreamKind::Console | StreamKind::Target => self.console.push_str(text.data()),
                StreamKind::Log => self.log.push_str(text.data()),
            }
            return None;
        }
        let body = line.trim_start_matches(|c: char| c.is_ascii_digit());
        if !body.starts_with('^') {
            trace!(%line, "ignoring out-of-band record");
            return None;
        }
        let mut response = DebuggerResponse::parse(line);
        response.console_stream_output = std::mem::take(&mut self.console);
        response.log_stream_output = std::mem::take(&mut self.log);
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_and_class() {
        let response = DebuggerResponse::parse(r#"33^error,msg="No symbol""#);
        assert_eq!(response.token, 33);
        assert_eq!(response.result_class, ResultClass::Error);
        assert_eq!(response.data.get("msg").data(), "No symbol");
        assert!(response.data.is_list());
    }

    #[test]
    fn missing_token_is_minus_one() {
        let response = DebuggerResponse::parse("^running");
        assert_eq!(response.token, -1);
        assert_eq!(response.result_class, ResultClass::Running);
        assert_eq!(response.data.child_count(), 0);
    }

    #[test]
    fn unknown_class() {
        assert_eq!(DebuggerResponse::parse("5^weird").result_class, ResultClass::Unknown);
        assert_eq!("bogus".parse::<ResultClass>(), Ok(ResultClass::Unknown));
    }

    #[test]
    fn assembler_attaches_streams() {
        let mut assembler = ReplyAssembler::new();
        assert!(assembler.feed(r#"~"Breakpoint 1\n""#).is_none());
        assert!(assembler.feed(r#"&"info break\n""#).is_none());
        assert!(assembler.feed(r#"*stopped,reason="breakpoint-hit""#).is_none());
        assert!(assembler.feed("(gdb)").is_none());
        let response = assembler.feed("7^done").unwrap();
        assert_eq!(response.token, 7);
        assert_eq!(response.console_stream_output, "Breakpoint 1\n");
        assert_eq!(response.log_stream_output, "info break\n");

        let next = assembler.feed("8^done").unwrap();
        assert!(next.console_stream_output.is_empty());
    }

    #[test]
    fn debug_string() {
        let response = DebuggerResponse::parse(r#"4^done,value="1""#);
        assert_eq!(response.to_debug_string(), r#"4^done,value="1""#);
    }
}
