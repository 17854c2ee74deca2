#![allow(dead_code)]

use debugger_protocol::GdbMi;

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

/// Indented dump of a parsed tree, one node per line.
pub fn dump(value: &GdbMi) -> String {
    let mut out = String::new();
    dump_into(value, 0, &mut out);
    out
}

fn dump_into(value: &GdbMi, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    if !value.name().is_empty() {
        out.push_str(value.name());
        out.push_str(": ");
    }
    out.push_str(&format!("{:?}", value.kind()));
    if !value.data().is_empty() {
        out.push_str(&format!(" {:?}", value.data()));
    }
    out.push('\n');
    for child in value.children() {
        dump_into(child, depth + 1, out);
    }
}
