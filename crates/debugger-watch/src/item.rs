//! Watch items and their parsing from dumper output.

use std::fmt::{self, Write as _};

use debugger_protocol::{
    decode_array_elements, decode_data, from_hex, hex, DebuggerEncoding, GdbMi,
};
use tracing::warn;

use crate::format::{pointer_value, quote_unprintable};
use crate::prefs::UnprintableBase;
use crate::types::{is_float_type, is_int_type, is_pointer_type, normalize_type};

/// Placeholder value shown when the backend sent an undecodable payload.
pub const ENCODING_ERROR: &str = "<Encoding error>";

/// Whether an item is known to have children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WantsChildren {
    /// Nothing reported; treated as childless until a fetch is requested.
    #[default]
    Unknown,
    Yes,
    No,
}

impl WantsChildren {
    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// How a value is edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditType {
    Bool,
    UnsignedInteger,
    SignedInteger,
    Double,
    String,
}

/// A value entered by the user, typed per [`EditType`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditValue {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Double(f64),
    Text(String),
}

impl fmt::Display for EditValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Unsigned(number) => write!(f, "{number}"),
            Self::Signed(number) => write!(f, "{number}"),
            Self::Double(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One node of the locals/watchers tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchItem {
    /// Internal hierarchical name, e.g. `local.obj.field`.
    pub iname: String,
    pub name: String,
    /// Expression evaluating to this item; empty when it is not addressable.
    pub exp: String,
    pub ty: String,
    pub value: String,
    /// Payload for the separated view.
    pub edit_data: String,
    /// Marker selecting the separated view, e.g. `imagedata:separate`.
    pub edit_format: String,
    pub edit_encoding: DebuggerEncoding,
    pub address: u64,
    /// Address of the pointer this item was dereferenced from.
    pub origaddr: u64,
    /// Size in bytes, `0` when unknown.
    pub size: u32,
    pub bitpos: i32,
    pub bitsize: i32,
    /// Characters cut from the value upstream: `> 0` known count, `< 0`
    /// unknown count, `0` complete.
    pub elided: i32,
    pub auto_deref_count: i32,
    /// Position for elements of a decoded array payload.
    pub array_index: Option<usize>,
    pub wants_children: WantsChildren,
    pub value_enabled: bool,
    pub value_editable: bool,
    pub(crate) outdated: bool,
}

impl Default for WatchItem {
    fn default() -> Self {
        Self {
            iname: String::new(),
            name: String::new(),
            exp: String::new(),
            ty: String::new(),
            value: String::new(),
            edit_data: String::new(),
            edit_format: String::new(),
            edit_encoding: DebuggerEncoding::default(),
            address: 0,
            origaddr: 0,
            size: 0,
            bitpos: 0,
            bitsize: 0,
            elided: 0,
            auto_deref_count: 0,
            array_index: None,
            wants_children: WantsChildren::Unknown,
            value_enabled: true,
            value_editable: true,
            outdated: false,
        }
    }
}

impl WatchItem {
    #[must_use]
    pub fn new(iname: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            iname: iname.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the type, stripping qualifiers the views do not show.
    pub fn set_type(&mut self, ty: &str) {
        self.ty = normalize_type(ty);
    }

    /// Sets the value. `{...}` stands for "has children, value not shown".
    pub fn set_value(&mut self, value: &str) {
        if value == "{...}" {
            self.value.clear();
            self.wants_children = WantsChildren::Yes;
        } else {
            self.value = value.to_string();
        }
    }

    /// Drops any child expectation, used for placeholders created while no
    /// backend session is running.
    pub fn set_all_unneeded(&mut self) {
        self.wants_children = WantsChildren::No;
    }

    #[must_use]
    pub fn hex_address(&self) -> String {
        if self.address == 0 {
            String::new()
        } else {
            format!("0x{:x}", self.address)
        }
    }

    /// Identity of the item for the separated view: its address when known.
    #[must_use]
    pub fn key(&self) -> String {
        if self.address == 0 {
            self.iname.clone()
        } else {
            self.hex_address()
        }
    }

    /// Expression evaluating to this item, built from the address or the
    /// parent expression when the backend reported none.
    #[must_use]
    pub fn expression(&self, parent: Option<&WatchItem>) -> String {
        if !self.exp.is_empty() {
            return self.exp.clone();
        }
        if self.address != 0 && !self.ty.is_empty() {
            return format!("*({}*)0x{:x}", self.ty, self.address);
        }
        if let Some(parent) = parent.filter(|parent| !parent.exp.is_empty()) {
            return format!("({}).{}", parent.exp, self.name);
        }
        self.name.clone()
    }

    /// Array elements inherit the category of their container, which the
    /// caller resolves; this checks the item's own iname.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.iname.starts_with("local.")
    }

    #[must_use]
    pub fn is_watcher(&self) -> bool {
        self.iname.starts_with("watch.")
    }

    #[must_use]
    pub fn is_inspect(&self) -> bool {
        self.iname.starts_with("inspect.")
    }

    #[must_use]
    pub fn is_vtable_pointer(&self) -> bool {
        self.ty.starts_with("__fptr()") || (self.ty.is_empty() && self.name == "[vptr]")
    }

    #[must_use]
    pub fn is_pointer(&self) -> bool {
        is_pointer_type(&self.ty)
    }

    #[must_use]
    pub fn edit_type(&self) -> EditType {
        if self.ty == "bool" {
            EditType::Bool
        } else if is_int_type(&self.ty) {
            if self.ty.contains('u') {
                EditType::UnsignedInteger
            } else {
                EditType::SignedInteger
            }
        } else if is_float_type(&self.ty) {
            EditType::Double
        } else if self.is_pointer() && self.value.starts_with("0x") {
            EditType::UnsignedInteger
        } else {
            EditType::String
        }
    }

    /// Current value converted for an in-place editor.
    #[must_use]
    pub fn edit_value(&self, unprintable_base: UnprintableBase) -> EditValue {
        match self.edit_type() {
            EditType::Bool => EditValue::Bool(self.value != "0" && self.value != "false"),
            EditType::UnsignedInteger if self.is_pointer() => {
                EditValue::Unsigned(pointer_value(&self.value))
            }
            EditType::UnsignedInteger => {
                EditValue::Unsigned(self.value.trim().parse().unwrap_or(0))
            }
            EditType::SignedInteger => EditValue::Signed(self.value.trim().parse().unwrap_or(0)),
            EditType::Double => EditValue::Double(self.value.trim().parse().unwrap_or(0.0)),
            EditType::String => {
                let mut text = self.value.clone();
                if text.ends_with('"') {
                    if let Some(first) = text.find('"') {
                        if first + 1 < text.len() {
                            text = text[first + 1..text.len() - 1].to_string();
                        }
                    }
                }
                let text = text.replace('\n', "\\n");
                EditValue::Text(quote_unprintable(&text, unprintable_base))
            }
        }
    }

    /// Plain-text summary for hover help.
    #[must_use]
    pub fn tool_tip(&self, expression: &str) -> String {
        let mut out = String::new();
        let mut row = |label: &str, value: &str| {
            let _ = writeln!(out, "{label}: {value}");
        };
        row("Name", &self.name);
        row("Expression", expression);
        row("Internal Type", &self.ty);
        let value: String = self.value.chars().take(1000).collect();
        row("Value", &value);
        if self.address != 0 {
            row("Object Address", &self.hex_address());
        }
        if self.origaddr != 0 {
            row("Pointer Address", &format!("0x{:x}", self.origaddr));
        }
        if let Some(index) = self.array_index {
            row("Array Index", &index.to_string());
        }
        if self.size != 0 {
            row("Static Object Size", &format!("{} bytes", self.size));
        }
        row("Internal ID", &self.iname);
        out
    }
}

/// A parsed item with the children reported alongside it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedItem {
    pub item: WatchItem,
    pub children: Vec<ParsedItem>,
}

impl ParsedItem {
    /// Builds an item (and its nested children) from one dumper record.
    ///
    /// Records without an `iname` take it from the record's own name
    /// (`locals`, `watchers`, ...) joined with the item name.
    #[must_use]
    pub fn parse(data: &GdbMi, sort_members: bool) -> Self {
        let mut parsed = Self::default();
        let item = &mut parsed.item;
        item.iname = data.get("iname").data().to_string();

        let wname = data.get("wname");
        if wname.is_valid() {
            item.name = from_hex(wname.data());
        } else {
            item.name = data.get("name").data().to_string();
        }
        if item.iname.is_empty() && !item.name.is_empty() {
            if let Some(root) = root_for_record(data.name()) {
                item.iname = format!("{root}.{}", item.name);
            }
        }

        parsed.parse_fields(data, sort_members);

        if wname.is_valid() {
            parsed.item.exp = parsed.item.name.clone();
        }
        parsed
    }

    fn parse_fields(&mut self, input: &GdbMi, sort_members: bool) {
        let item = &mut self.item;

        let mi = input.get("type");
        if mi.is_valid() {
            item.set_type(mi.data());
        }

        item.edit_data = input.get("editvalue").data().to_string();
        item.edit_format = input.get("editformat").data().to_string();
        item.edit_encoding = DebuggerEncoding::parse(input.get("editencoding").data());

        set_int(input, "valueelided", &mut item.elided);
        set_int(input, "bitpos", &mut item.bitpos);
        set_int(input, "bitsize", &mut item.bitsize);

        let mi = input.get("origaddr");
        if mi.is_valid() {
            item.origaddr = mi.to_address();
        }

        let mi = input.get("address");
        if mi.is_valid() {
            item.address = mi.to_address();
            if item.exp.is_empty() {
                if item.iname.starts_with("local.") && item.iname.matches('.').count() == 1 {
                    item.exp = item.name.clone();
                } else {
                    item.exp = format!("*({}*){}", item.ty, item.hex_address());
                }
            }
        }

        let mi = input.get("value");
        let encoding = input.get("valueencoded").data();
        if mi.is_valid() || !encoding.is_empty() {
            match decode_data(mi.data(), encoding) {
                Ok(value) => item.set_value(&value),
                Err(err) => {
                    warn!(iname = %item.iname, %encoding, error = %err, "cannot decode value");
                    item.set_value(ENCODING_ERROR);
                }
            }
            let suffix = input.get("valuesuffix");
            if suffix.is_valid() {
                item.value.push_str(suffix.data());
            }
        }

        let mi = input.get("size");
        if mi.is_valid() {
            item.size = u32::try_from(mi.to_int()).unwrap_or(0);
        }

        let mi = input.get("exp");
        if mi.is_valid() {
            item.exp = mi.data().to_string();
        }

        set_bool(input, "valueenabled", &mut item.value_enabled);
        set_bool(input, "valueeditable", &mut item.value_editable);

        let mi = input.get("autoderefcount");
        if mi.is_valid() {
            if let Ok(count) = mi.data().trim().parse::<i32>() {
                item.auto_deref_count = count;
            }
        }

        let mi = input.get("numchild");
        if mi.is_valid() {
            item.wants_children = WantsChildren::from_flag(mi.to_int() > 0);
        }
        let mi = input.get("haschild");
        if mi.is_valid() {
            item.wants_children = WantsChildren::from_flag(mi.to_int() > 0);
        }

        let array = input.get("arraydata");
        if array.is_valid() {
            let encoding = DebuggerEncoding::parse(input.get("arrayencoding").data());
            let child_type = input.get("childtype").data();
            self.decode_array(array.data(), &encoding, child_type);
            return;
        }

        let children = input.get("children");
        if !children.is_valid() {
            return;
        }
        let child_type = input.get("childtype");
        let child_num_child = input.get("childnumchild");
        let address_base = debugger_protocol::number::parse_unsigned(input.get("addrbase").data())
            .unwrap_or(0);
        let address_step = debugger_protocol::number::parse_unsigned(input.get("addrstep").data())
            .unwrap_or(0);

        for (index, sub) in children.children().iter().enumerate() {
            let mut child = ParsedItem::default();
            if child_type.is_valid() {
                child.item.set_type(child_type.data());
            }
            if child_num_child.is_valid() {
                child.item.wants_children = WantsChildren::from_flag(child_num_child.to_int() > 0);
            }
            let name = sub.get("name");
            let segment = if name.is_valid() {
                child.item.name = name.data().to_string();
                name.data().to_string()
            } else {
                child.item.name = format!("[{index}]");
                index.to_string()
            };
            let iname = sub.get("iname");
            child.item.iname = if iname.is_valid() {
                iname.data().to_string()
            } else {
                format!("{}.{segment}", self.item.iname)
            };
            if address_step != 0 {
                let offset = u64::try_from(index).unwrap_or(0).wrapping_mul(address_step);
                child.item.address = address_base.wrapping_add(offset);
                child.item.exp = format!("*({}*){}", child.item.ty, child.item.hex_address());
            }
            let key = sub.get("key");
            if !key.data().is_empty() {
                child.item.name = decode_data(key.data(), sub.get("keyencoded").data())
                    .unwrap_or_else(|err| {
                        warn!(error = %err, "cannot decode key");
                        ENCODING_ERROR.to_string()
                    });
            }
            child.item.name = format!("{}{}", sub.get("keyprefix").data(), child.item.name);
            child.parse_fields(sub, sort_members);
            self.children.push(child);
        }

        if sort_members && input.get("sortable").to_int() != 0 {
            self.children.sort_by(|a, b| a.item.name.cmp(&b.item.name));
        }
    }

    fn decode_array(&mut self, payload: &str, encoding: &DebuggerEncoding, child_type: &str) {
        let bytes = hex::decode_bytes_lenient(payload);
        let elements = match decode_array_elements(&bytes, encoding) {
            Ok(elements) => elements,
            Err(err) => {
                warn!(iname = %self.item.iname, error = %err, "cannot decode array data");
                return;
            }
        };
        let size = u32::try_from(encoding.size).unwrap_or(0);
        for (index, value) in elements.into_iter().enumerate() {
            let item = WatchItem {
                iname: format!("{}.{index}", self.item.iname),
                name: format!("[{index}]"),
                ty: child_type.to_string(),
                value,
                size,
                array_index: Some(index),
                wants_children: WantsChildren::No,
                ..WatchItem::default()
            };
            self.children.push(ParsedItem {
                item,
                children: Vec::new(),
            });
        }
    }
}

/// Maps a result record name to the root iname its items belong to.
fn root_for_record(record: &str) -> Option<&'static str> {
    match record {
        "locals" | "local" => Some("local"),
        "watchers" | "watch" => Some("watch"),
        "inspect" => Some("inspect"),
        "return" => Some("return"),
        "tooltip" => Some("tooltip"),
        _ => None,
    }
}

fn set_int(input: &GdbMi, name: &str, target: &mut i32) {
    let mi = input.get(name);
    if mi.is_valid() {
        *target = mi.to_int();
    }
}

fn set_bool(input: &GdbMi, name: &str, target: &mut bool) {
    match input.get(name).data() {
        "true" => *target = true,
        "false" => *target = false,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedItem {
        ParsedItem::parse(&GdbMi::parse(text), true)
    }

    #[test]
    fn scalar_fields() {
        let parsed = parse(
            r#"{iname="local.x",name="x",type="const int",value="5",size="4",valueeditable="false"}"#,
        );
        let item = &parsed.item;
        assert_eq!(item.iname, "local.x");
        assert_eq!(item.ty, "int");
        assert_eq!(item.value, "5");
        assert_eq!(item.size, 4);
        assert!(!item.value_editable);
        assert_eq!(item.wants_children, WantsChildren::Unknown);
    }

    #[test]
    fn iname_from_record_name() {
        let data = GdbMi::parse_multiple(r#"locals={name="x",value="5",type="int"}"#);
        let parsed = ParsedItem::parse(&data.children()[0], false);
        assert_eq!(parsed.item.iname, "local.x");
    }

    #[test]
    fn watcher_name_is_hex() {
        let parsed = parse(r#"{iname="watch.0",wname="612b62",value="3"}"#);
        assert_eq!(parsed.item.name, "a+b");
        assert_eq!(parsed.item.exp, "a+b");
    }

    #[test]
    fn placeholder_value_wants_children() {
        let parsed = parse(r#"{iname="local.s",name="s",value="{...}"}"#);
        assert!(parsed.item.value.is_empty());
        assert_eq!(parsed.item.wants_children, WantsChildren::Yes);
    }

    #[test]
    fn address_builds_expression() {
        let parsed = parse(r#"{iname="local.p.q",name="q",type="Foo",address="0x1000"}"#);
        assert_eq!(parsed.item.exp, "*(Foo*)0x1000");
        let parsed = parse(r#"{iname="local.p",name="p",type="Foo",address="0x1000"}"#);
        assert_eq!(parsed.item.exp, "p");
    }

    #[test]
    fn children_keep_reported_order_unless_sortable() {
        let text = r#"{iname="local.s",name="s",childtype="int",children=[{name="b",value="1"},{name="a",value="2"}]}"#;
        let parsed = parse(text);
        let names: Vec<_> = parsed.children.iter().map(|c| c.item.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(parsed.children[0].item.iname, "local.s.b");
        assert_eq!(parsed.children[0].item.ty, "int");

        let sorted = parse(&text.replace("childtype", "sortable=\"1\",childtype"));
        let names: Vec<_> = sorted.children.iter().map(|c| c.item.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn unnamed_children_are_indexed() {
        let parsed = parse(
            r#"{iname="local.v",name="v",addrbase="0x100",addrstep="4",childtype="int",children=[{value="7"},{value="8"}]}"#,
        );
        assert_eq!(parsed.children[1].item.name, "[1]");
        assert_eq!(parsed.children[1].item.iname, "local.v.1");
        assert_eq!(parsed.children[1].item.address, 0x104);
        assert_eq!(parsed.children[1].item.exp, "*(int*)0x104");
    }

    #[test]
    fn array_payload() {
        let parsed = parse(
            r#"{iname="local.a",name="a",arraydata="0100000002000000",arrayencoding="int:4",childtype="int"}"#,
        );
        assert_eq!(parsed.children.len(), 2);
        assert_eq!(parsed.children[1].item.value, "2");
        assert_eq!(parsed.children[1].item.array_index, Some(1));
    }

    #[test]
    fn undecodable_value_is_placeholder() {
        let parsed = parse(r#"{iname="local.x",name="x",value="41",valueencoded="bogus"}"#);
        assert_eq!(parsed.item.value, ENCODING_ERROR);
    }

    #[test]
    fn edit_values() {
        let mut item = WatchItem::new("local.b", "b");
        item.ty = "bool".into();
        item.value = "false".into();
        assert_eq!(item.edit_value(UnprintableBase::CEscapes), EditValue::Bool(false));

        item.ty = "char *".into();
        item.value = "0x1f \"abc\"".into();
        assert_eq!(item.edit_type(), EditType::UnsignedInteger);
        assert_eq!(item.edit_value(UnprintableBase::CEscapes), EditValue::Unsigned(0x1f));

        item.ty = "QString".into();
        item.value = "\"a\nb\"".into();
        assert_eq!(
            item.edit_value(UnprintableBase::CEscapes),
            EditValue::Text("a\\nb".into())
        );
    }

    #[test]
    fn expression_fallbacks() {
        let parent = WatchItem {
            exp: "obj".into(),
            ..WatchItem::new("local.obj", "obj")
        };
        let child = WatchItem::new("local.obj.f", "f");
        assert_eq!(child.expression(Some(&parent)), "(obj).f");
        assert_eq!(child.expression(None), "f");
    }
}
