mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::init_tracing;
use debugger_protocol::{
    decode_data, from_hex, to_hex, CommandFlags, CommandQueue, DebuggerCommand,
    DebuggerCommandSequence, DebuggerResponse, DisplayFormat, ResultClass,
};

#[test]
fn result_class_round_trip() {
    for class in [
        ResultClass::Done,
        ResultClass::Running,
        ResultClass::Connected,
        ResultClass::Error,
        ResultClass::Exit,
    ] {
        assert_eq!(ResultClass::classify(&class.to_string()), class);
        let response = DebuggerResponse::parse(&format!("9^{class}"));
        assert_eq!(response.result_class, class);
    }
}

#[test]
fn hex_round_trip() {
    for text in ["", " ", "a+b", "~!@#$%^&*()_+{}|:<>?", "x == \"y\""] {
        assert_eq!(from_hex(&to_hex(text)), text);
    }
}

#[test]
fn string_list_arguments_are_hex_encoded_per_element() {
    let mut cmd = DebuggerCommand::new("fetchVariables");
    cmd.arg("x", vec!["a".to_string(), "b".to_string()]);
    let list = cmd.args["x"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(from_hex(list[0].as_str().unwrap()), "a");
    assert_eq!(from_hex(list[1].as_str().unwrap()), "b");
}

// Quirk: a sequence continues only if the last appended command asked for it.
#[test]
fn sequence_continuation_is_last_wins() {
    let mut sequence = DebuggerCommandSequence::new();
    sequence.append(DebuggerCommand::new("a"), true);
    sequence.append(DebuggerCommand::new("b"), false);
    assert!(!sequence.want_continue());
    sequence.append(DebuggerCommand::new("c"), true);
    assert!(sequence.want_continue());
    assert_eq!(sequence.commands().len(), 3);
}

#[test]
fn exit_request_accepts_exit_reply() {
    init_tracing();
    let fired = Rc::new(Cell::new(false));
    let mut queue = CommandQueue::new();
    let token = {
        let fired = Rc::clone(&fired);
        queue.post(
            DebuggerCommand::new("exitGdb")
                .with_flags(CommandFlags::EXIT_REQUEST | CommandFlags::LOSES_CHILD)
                .with_callback(move |response| {
                    assert_eq!(response.result_class, ResultClass::Exit);
                    fired.set(true);
                }),
        )
    };
    assert!(queue.dispatch(&DebuggerResponse::parse(&format!("{token}^exit"))));
    assert!(fired.get());
    assert_eq!(queue.pending_count(), 0);
}

#[test]
fn decode_errors_surface() {
    init_tracing();
    assert!(decode_data("0102", "uint:3").is_err());
    assert_eq!(decode_data("0102", "uint:2").unwrap(), "513");
}

#[test]
fn persisted_format_codes() {
    assert_eq!(DisplayFormat::from_code(23), DisplayFormat::HexadecimalInteger);
    assert_eq!(DisplayFormat::from_code(99), DisplayFormat::Automatic);
}
