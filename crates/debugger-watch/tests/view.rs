mod common;

use common::{handler, TestHandler};
use debugger_protocol::{DisplayFormat, GdbMi};
use debugger_watch::{
    Column, EditType, EditValue, EngineCapabilities, EngineState, ItemFlags, ItemId, ItemRole,
    RoleValue, ValueColor, WatchConfig, WatchEvent,
};
use expect_test::expect;

const EDITABLE: ItemFlags = ItemFlags::SELECTABLE
    .union(ItemFlags::ENABLED)
    .union(ItemFlags::EDITABLE);
const NOT_EDITABLE: ItemFlags = ItemFlags::SELECTABLE.union(ItemFlags::ENABLED);

fn populated() -> TestHandler {
    let mut handler = handler();
    handler.insert_items(&GdbMi::parse(
        r#"data=[
            {iname="local.x",name="x",value="5",type="int"},
            {iname="local.p",name="p",value="0x1000",type="int *",numchild="1"},
            {iname="local.s",name="s",value="\"long\"",type="std::string",valueelided="-1"},
            {iname="inspect.o",name="o",value="1",type="int"}]"#,
    ));
    handler.watch_expression("x + 1", "");
    handler.insert_items(&GdbMi::parse(
        r#"data=[{iname="watch.0",exp="x + 1",name="x + 1",value="6",type="int"}]"#,
    ));
    handler
}

fn id(handler: &TestHandler, iname: &str) -> ItemId {
    handler.tree().find(iname).unwrap()
}

fn text(handler: &TestHandler, iname: &str, column: Column, role: ItemRole) -> String {
    match handler.data(id(handler, iname), column, role) {
        Some(RoleValue::Text(text)) => text,
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn display_columns() {
    let handler = populated();
    assert_eq!(text(&handler, "local.x", Column::Name, ItemRole::Display), "x");
    assert_eq!(text(&handler, "local.p", Column::Value, ItemRole::Display), "0x1000");
    assert_eq!(
        text(&handler, "local.s", Column::Value, ItemRole::Display),
        "\"long\"... (unknown length)"
    );
    assert_eq!(
        text(&handler, "local.s", Column::Type, ItemRole::Display),
        "std::string"
    );
    assert_eq!(text(&handler, "local", Column::Name, ItemRole::Display), "Locals");
}

#[test]
fn type_role_hides_configured_namespaces() {
    let mut handler = populated();
    handler.apply_config(WatchConfig {
        show_std_namespace: false,
        ..WatchConfig::default()
    });
    assert_eq!(text(&handler, "local.s", Column::Type, ItemRole::Type), "string");
    assert_eq!(
        text(&handler, "local.s", Column::Type, ItemRole::RawType),
        "std::string"
    );
}

#[test]
fn edit_roles() {
    let handler = populated();
    let x = id(&handler, "local.x");
    assert_eq!(
        handler.data(x, Column::Value, ItemRole::EditType),
        Some(RoleValue::EditType(EditType::SignedInteger))
    );
    assert_eq!(
        handler.data(x, Column::Value, ItemRole::Edit),
        Some(RoleValue::Edit(EditValue::Signed(5)))
    );
    assert_eq!(text(&handler, "local.x", Column::Name, ItemRole::Edit), "x");
    assert_eq!(text(&handler, "watch.0", Column::Name, ItemRole::Expression), "x + 1");
    assert_eq!(text(&handler, "local.x", Column::Name, ItemRole::IName), "local.x");
}

#[test]
fn integer_base_follows_format() {
    let mut handler = populated();
    let x = id(&handler, "local.x");
    let p = id(&handler, "local.p");
    assert_eq!(
        handler.data(x, Column::Value, ItemRole::IntegerBase),
        Some(RoleValue::Int(10))
    );
    assert_eq!(
        handler.data(p, Column::Value, ItemRole::IntegerBase),
        Some(RoleValue::Int(16))
    );
    handler.set_individual_format("local.x", DisplayFormat::HexadecimalInteger);
    assert_eq!(
        handler.data(x, Column::Value, ItemRole::IntegerBase),
        Some(RoleValue::Int(16))
    );
    assert_eq!(
        handler.data(x, Column::Value, ItemRole::IndividualFormat),
        Some(RoleValue::Format(DisplayFormat::HexadecimalInteger))
    );
}

#[test]
fn format_list_for_pointer() {
    let handler = populated();
    let formats = handler.type_format_list(id(&handler, "local.p"));
    assert_eq!(formats.first(), Some(&DisplayFormat::Raw));
    assert!(formats.contains(&DisplayFormat::Array1000));
    assert!(formats.ends_with(&[
        DisplayFormat::DecimalInteger,
        DisplayFormat::HexadecimalInteger,
        DisplayFormat::BinaryInteger,
        DisplayFormat::OctalInteger,
    ]));
}

#[test]
fn watchpoint_roles() {
    let mut handler = populated();
    handler.engine_mut().watchpoints.push(0x1000);
    let p = id(&handler, "local.p");
    assert_eq!(
        handler.data(p, Column::Value, ItemRole::IsWatchpointAtPointerAddress),
        Some(RoleValue::Bool(true))
    );
    assert_eq!(
        handler.data(p, Column::Value, ItemRole::IsWatchpointAtObjectAddress),
        Some(RoleValue::Bool(false))
    );
}

#[test]
fn tooltips_follow_config() {
    let mut handler = populated();
    let x = id(&handler, "local.x");
    assert_eq!(handler.data(x, Column::Name, ItemRole::ToolTip), None);
    handler.apply_config(WatchConfig {
        use_tooltips_in_locals_view: true,
        ..WatchConfig::default()
    });
    expect![[r#"
        Name: x
        Expression: x
        Internal Type: int
        Value: 5
        Internal ID: local.x
    "#]]
    .assert_eq(&text(&handler, "local.x", Column::Name, ItemRole::ToolTip));
}

#[test]
fn value_colors() {
    let mut handler = populated();
    let x = id(&handler, "local.x");
    let color = |handler: &TestHandler, column| handler.data(x, column, ItemRole::Foreground);

    assert_eq!(
        color(&handler, Column::Value),
        Some(RoleValue::Color(ValueColor::Changed))
    );
    assert_eq!(
        color(&handler, Column::Name),
        Some(RoleValue::Color(ValueColor::Normal))
    );

    handler.reset_value_cache();
    assert_eq!(
        color(&handler, Column::Value),
        Some(RoleValue::Color(ValueColor::Normal))
    );

    handler.notify_update_started(&[]);
    assert_eq!(
        color(&handler, Column::Name),
        Some(RoleValue::Color(ValueColor::Invalid))
    );
    let o = id(&handler, "inspect.o");
    assert_eq!(
        handler.data(o, Column::Value, ItemRole::Foreground),
        Some(RoleValue::Color(ValueColor::Normal))
    );

    handler.insert_items(&GdbMi::parse(
        r#"data=[{iname="local.x",name="x",value="7",type="int"}]"#,
    ));
    handler.notify_update_finished();
    let x = id(&handler, "local.x");
    assert_eq!(
        handler.data(x, Column::Value, ItemRole::Foreground),
        Some(RoleValue::Color(ValueColor::Changed))
    );
}

#[test]
fn lazy_children_hidden_while_stale() {
    let mut handler = populated();
    let p = id(&handler, "local.p");
    let x = id(&handler, "local.x");
    assert!(handler.has_children(p));
    assert!(!handler.has_children(x));
    assert!(handler.has_children(handler.tree().root()));

    handler.schedule_reset_location();
    assert!(!handler.can_fetch_more(p));
    assert!(!handler.has_children(p));
}

#[test]
fn local_flags_depend_on_engine_state() {
    let mut handler = populated();
    let x = id(&handler, "local.x");
    let s = id(&handler, "local.s");
    assert_eq!(handler.flags(x, Column::Value), EDITABLE);
    assert_eq!(handler.flags(x, Column::Name), NOT_EDITABLE);
    assert_eq!(handler.flags(s, Column::Value), NOT_EDITABLE);

    handler.engine_mut().state = EngineState::InferiorRunOk;
    assert_eq!(handler.flags(x, Column::Value), NOT_EDITABLE);
    handler.engine_mut().capabilities = EngineCapabilities::ADD_WATCHER_WHILE_RUNNING;
    assert_eq!(handler.flags(x, Column::Value), EDITABLE);

    handler.engine_mut().state = EngineState::InferiorUnrunnable;
    assert_eq!(handler.flags(x, Column::Value), NOT_EDITABLE);
}

#[test]
fn watcher_flags() {
    let mut handler = populated();
    let watcher = id(&handler, "watch.0");
    assert_eq!(handler.flags(watcher, Column::Name), EDITABLE);
    assert_eq!(handler.flags(watcher, Column::Value), EDITABLE);
    assert_eq!(handler.flags(watcher, Column::Type), NOT_EDITABLE);

    handler.engine_mut().state = EngineState::InferiorUnrunnable;
    assert_eq!(handler.flags(watcher, Column::Name), EDITABLE);
    assert_eq!(handler.flags(watcher, Column::Value), NOT_EDITABLE);

    handler.engine_mut().state = EngineState::InferiorRunOk;
    assert_eq!(handler.flags(watcher, Column::Name), NOT_EDITABLE);
}

#[test]
fn inspector_and_root_flags() {
    let mut handler = populated();
    let o = id(&handler, "inspect.o");
    handler.engine_mut().state = EngineState::InferiorUnrunnable;
    assert_eq!(handler.flags(o, Column::Value), EDITABLE);
    assert_eq!(handler.flags(handler.tree().root(), Column::Name), NOT_EDITABLE);

    let x = id(&handler, "local.x");
    handler.remove_item_by_iname("local.x");
    assert_eq!(handler.flags(x, Column::Value), ItemFlags::empty());
    assert_eq!(handler.data(x, Column::Value, ItemRole::Display), None);
}

#[test]
fn edits_reach_the_engine() {
    let mut handler = populated();
    let x = id(&handler, "local.x");
    assert!(handler.set_data(
        x,
        Column::Value,
        ItemRole::Edit,
        RoleValue::Edit(EditValue::Signed(7))
    ));
    assert!(handler.set_data(
        x,
        Column::Value,
        ItemRole::IndividualFormat,
        RoleValue::Format(DisplayFormat::BinaryInteger)
    ));
    assert!(!handler.set_data(
        x,
        Column::Value,
        ItemRole::TypeFormat,
        RoleValue::Bool(true)
    ));
    assert_eq!(
        handler.engine_mut().take_calls(),
        ["assign local.x x Signed(7)", "update_locals"]
    );
    assert_eq!(handler.format("local.x"), DisplayFormat::BinaryInteger);
}

#[test]
fn name_edits_always_rename_the_watcher() {
    let mut handler = populated();
    let watcher = id(&handler, "watch.0");
    handler.engine_mut().take_calls();

    assert!(handler.set_data(
        watcher,
        Column::Name,
        ItemRole::Edit,
        RoleValue::Edit(EditValue::Text(" y * 2 ".into()))
    ));
    assert_eq!(handler.watched_expressions(), ["y * 2"]);
    assert!(handler.set_data(watcher, Column::Name, ItemRole::Edit, RoleValue::Int(42)));
    assert_eq!(handler.watched_expressions(), ["42"]);
    assert_eq!(handler.find_item("watch.0").unwrap().exp, "42");
    assert_eq!(
        handler.engine_mut().take_calls(),
        ["update_item watch.0", "update_item watch.0"]
    );
}

#[test]
fn expansion_through_set_data() {
    let mut handler = populated();
    let p = id(&handler, "local.p");
    handler.take_events();
    assert!(handler.set_data(p, Column::Name, ItemRole::Expanded, RoleValue::Bool(true)));
    assert_eq!(
        handler.data(p, Column::Name, ItemRole::Expanded),
        Some(RoleValue::Bool(true))
    );
    assert_eq!(handler.take_events(), [WatchEvent::ColumnAdjustmentRequested]);

    handler.set_data(p, Column::Name, ItemRole::Expanded, RoleValue::Bool(false));
    assert!(!handler.is_expanded_iname("local.p"));
}

#[test]
fn column_width_items_cover_watchers() {
    let handler = populated();
    assert_eq!(handler.column_width_items(), [id(&handler, "watch.0")]);
}
