#![no_main]

use debugger_protocol::{decode_data, read_numeric_vector, DebuggerEncoding};
use libfuzzer_sys::fuzz_target;

const MAX_PAYLOAD_BYTES: usize = 4096;

const ENCODINGS: &[&str] = &[
    "",
    "local8bit",
    "latin1",
    "utf8",
    "utf16",
    "ucs4",
    "int:1",
    "int:2",
    "int:4",
    "uint:8",
    "float:4",
    "float:8",
    "juliandate",
    "millisecondssincemidnight",
    "juliandateandmillisecondssincemidnight",
    "ipv6addressandhexscopeid",
    "datetimeinternal",
];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let capped = &rest[..rest.len().min(MAX_PAYLOAD_BYTES)];
    let payload = String::from_utf8_lossy(capped);
    let encoding = ENCODINGS[usize::from(selector) % ENCODINGS.len()];

    let _ = decode_data(&payload, encoding);
    let _ = read_numeric_vector(capped, &DebuggerEncoding::parse(encoding));
});
