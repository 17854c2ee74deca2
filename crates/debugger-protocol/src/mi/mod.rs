//! The `GdbMi` generic value tree.
//!
//! Every backend reply is decoded into this one tagged tree shape: constants
//! carry a string payload, tuples and lists carry ordered children. Tuples are
//! looked up by child name, lists are read in order.

mod cstring;
mod cursor;
mod parser;

use std::fmt;

pub use cstring::escape_cstring;

use crate::number::parse_unsigned;
use parser::Parser;

/// Node kind of a [`GdbMi`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MiType {
    /// Nothing could be parsed.
    #[default]
    Invalid,
    /// A C-string constant.
    Const,
    /// Named fields in braces.
    Tuple,
    /// Values in brackets.
    List,
}

/// One parsed backend value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GdbMi {
    pub(crate) name: String,
    pub(crate) data: String,
    pub(crate) children: Vec<GdbMi>,
    pub(crate) kind: MiType,
}

static INVALID: GdbMi = GdbMi {
    name: String::new(),
    data: String::new(),
    children: Vec::new(),
    kind: MiType::Invalid,
};

impl GdbMi {
    /// Parses a single value, optionally preceded by `name=`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut node = Self::default();
        Parser::new(text).parse_result_or_value(&mut node);
        node
    }

    /// Parses a brace-less sequence of values into a synthetic list.
    ///
    /// This is the shape of top-level records such as `a="1",b={...}`.
    #[must_use]
    pub fn parse_multiple(text: &str) -> Self {
        let mut node = Self::default();
        Parser::new(text).parse_tuple_body(&mut node);
        node.kind = MiType::List;
        node
    }

    /// Creates a named constant.
    #[must_use]
    pub fn constant(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            children: Vec::new(),
            kind: MiType::Const,
        }
    }

    /// Creates a named tuple.
    #[must_use]
    pub fn tuple(name: impl Into<String>, children: Vec<GdbMi>) -> Self {
        Self {
            name: name.into(),
            data: String::new(),
            children,
            kind: MiType::Tuple,
        }
    }

    /// Creates a named list.
    #[must_use]
    pub fn list(name: impl Into<String>, children: Vec<GdbMi>) -> Self {
        Self {
            name: name.into(),
            data: String::new(),
            children,
            kind: MiType::List,
        }
    }

    #[must_use]
    pub fn kind(&self) -> MiType {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.kind != MiType::Invalid
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.kind == MiType::List
    }

    /// Scalar payload; empty for anything but constants.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    #[must_use]
    pub fn children(&self) -> &[GdbMi] {
        &self.children
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn child_at(&self, index: usize) -> Option<&GdbMi> {
        self.children.get(index)
    }

    /// Returns the first child called `name`, or an invalid node.
    #[must_use]
    pub fn get(&self, name: &str) -> &GdbMi {
        self.children
            .iter()
            .find(|child| child.name == name)
            .unwrap_or(&INVALID)
    }

    /// Integer payload, `0` when the payload is not a number.
    #[must_use]
    pub fn to_int(&self) -> i32 {
        self.data.trim().parse().unwrap_or(0)
    }

    /// Address payload.
    ///
    /// Accepts a trailing `L` and a leading `*` or `@` as printed by some
    /// backends, and C-style `0x`/octal/decimal notation.
    #[must_use]
    pub fn to_address(&self) -> u64 {
        let mut text = self.data.trim();
        text = text.strip_suffix('L').unwrap_or(text);
        text = text
            .strip_prefix('*')
            .or_else(|| text.strip_prefix('@'))
            .unwrap_or(text);
        parse_unsigned(text).unwrap_or(0)
    }

    /// Serializes the tree back into the grammar it was parsed from.
    #[must_use]
    pub fn to_string_repr(&self, multiline: bool) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, multiline, 0);
        out
    }

    fn write_repr(&self, out: &mut String, multiline: bool, indent: usize) {
        if self.kind != MiType::Invalid && !self.name.is_empty() {
            out.push_str(&self.name);
            out.push('=');
        }
        match self.kind {
            MiType::Invalid => out.push_str("Invalid"),
            MiType::Const => {
                out.push('"');
                out.push_str(&escape_cstring(&self.data));
                out.push('"');
            }
            MiType::Tuple => self.write_children(out, multiline, indent, '{', '}'),
            MiType::List => self.write_children(out, multiline, indent, '[', ']'),
        }
    }

    fn write_children(
        &self,
        out: &mut String,
        multiline: bool,
        indent: usize,
        open: char,
        close: char,
    ) {
        out.push(open);
        if multiline {
            out.push('\n');
        }
        for (index, child) in self.children.iter().enumerate() {
            if index > 0 {
                out.push(',');
                if multiline {
                    out.push('\n');
                }
            }
            if multiline {
                out.push_str(&"  ".repeat(indent + 1));
            }
            child.write_repr(out, multiline, indent + 1);
        }
        if multiline {
            out.push('\n');
            out.push_str(&"  ".repeat(indent));
        }
        out.push(close);
    }
}

impl fmt::Display for GdbMi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_repr(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_child_is_invalid() {
        let value = GdbMi::parse(r#"{a="1"}"#);
        assert!(!value.get("b").is_valid());
        assert_eq!(value.get("b").data(), "");
        assert!(!value.get("a").get("x").is_valid());
    }

    #[test]
    fn address_forms() {
        assert_eq!(GdbMi::constant("", "0x1000").to_address(), 0x1000);
        assert_eq!(GdbMi::constant("", "*0x10L").to_address(), 0x10);
        assert_eq!(GdbMi::constant("", "@4096").to_address(), 4096);
        assert_eq!(GdbMi::constant("", "010").to_address(), 8);
        assert_eq!(GdbMi::constant("", "junk").to_address(), 0);
    }

    #[test]
    fn reserialized_form_parses_to_same_tree() {
        let text = r#"data=[{iname="local.s",name="s",value="a\"b\n",children=[]},{x="1"}]"#;
        let first = GdbMi::parse(text);
        let second = GdbMi::parse(&first.to_string_repr(false));
        assert_eq!(first, second);
        let third = GdbMi::parse(&first.to_string_repr(true));
        assert_eq!(first, third);
    }

    #[test]
    fn multiline_dump() {
        let value = GdbMi::parse(r#"{a="1",b=["x"]}"#);
        expect_test::expect![[r#"
            {
              a="1",
              b=[
                "x"
              ]
            }"#]]
        .assert_eq(&value.to_string_repr(true));
    }
}
