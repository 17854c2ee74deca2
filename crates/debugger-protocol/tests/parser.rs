mod common;

use common::{dump, init_tracing};
use debugger_protocol::{GdbMi, MiType};
use expect_test::expect;

#[test]
fn locals_record() {
    init_tracing();
    let value = GdbMi::parse_multiple(
        r#"data=[{iname="local.v",name="v",type="std::vector<int>",value="<2 items>",numchild="2",children=[{name="[0]",value="1"},{name="[1]",value="2"}]}],typeinfo=[]"#,
    );
    expect![[r#"
        List
          data: List
            Tuple
              iname: Const "local.v"
              name: Const "v"
              type: Const "std::vector<int>"
              value: Const "<2 items>"
              numchild: Const "2"
              children: List
                Tuple
                  name: Const "[0]"
                  value: Const "1"
                Tuple
                  name: Const "[1]"
                  value: Const "2"
          typeinfo: List
    "#]]
    .assert_eq(&dump(&value));
}

#[test]
fn canonical_form_reparses_identically() {
    let inputs = [
        r#"{a="1",b=["x","y"],c={d="\t\"q\"\\"}}"#,
        r#"frame={level="0",addr="0x0000555555555131",func="main",args=[]}"#,
        r#"["", "a", {}]"#,
        r#"msg="\303\244 and \x41""#,
    ];
    for input in inputs {
        let first = GdbMi::parse(input);
        assert!(first.is_valid(), "{input}");
        let canonical = first.to_string_repr(false);
        let second = GdbMi::parse(&canonical);
        assert_eq!(first, second, "{input} -> {canonical}");
    }
}

#[test]
fn truncated_output_degrades() {
    init_tracing();
    let full = r#"data=[{name="a",value="1"},{name="b",value="2"}]"#;
    for end in 0..full.len() {
        let value = GdbMi::parse_multiple(&full[..end]);
        assert_eq!(value.kind(), MiType::List);
    }
    let partial = GdbMi::parse_multiple(&full[..full.len() - 12]);
    let data = partial.get("data");
    assert_eq!(data.child_at(0).map(|c| c.get("value").data()), Some("1"));
}

#[test]
fn unterminated_string_keeps_prefix() {
    let value = GdbMi::parse(r#"{msg="hello wor"#);
    assert_eq!(value.get("msg").data(), "hello wor");
}

#[test]
fn octal_escaped_utf8() {
    let value = GdbMi::parse(r#"name="\303\244\303\266""#);
    assert_eq!(value.data(), "äö");
}
