#![no_main]

use debugger_protocol::{DebuggerResponse, GdbMi, ReplyAssembler};
use libfuzzer_sys::fuzz_target;

const MAX_INPUT_BYTES: usize = 8192;

fn decode_input(bytes: &[u8]) -> String {
    let capped = &bytes[..bytes.len().min(MAX_INPUT_BYTES)];
    String::from_utf8_lossy(capped).into_owned()
}

fn walk(value: &GdbMi, depth: usize) {
    if depth > 64 {
        return;
    }
    let _ = value.to_int();
    let _ = value.to_address();
    for child in value.children() {
        walk(child, depth + 1);
    }
}

fuzz_target!(|data: &[u8]| {
    let text = decode_input(data);

    let single = GdbMi::parse(&text);
    walk(&single, 0);
    let _ = single.to_string_repr(true);

    let multiple = GdbMi::parse_multiple(&text);
    walk(&multiple, 0);

    let _ = DebuggerResponse::parse(&text);

    let mut assembler = ReplyAssembler::new();
    for line in text.lines() {
        let _ = assembler.feed(line);
    }
});
