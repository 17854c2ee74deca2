//! Recursive descent over the `GdbMi` value grammar.
//!
//! ```text
//! result_or_value := value | name ('=' value)?
//! value           := cstring | '{' tuple_body | '[' list_body
//! tuple_body      := (result_or_value (',' result_or_value)*)? '}'
//! list_body       := (result_or_value (',' result_or_value)*)? ']'
//! ```
//!
//! Each rule consumes exactly its own span. Nothing here fails: on malformed
//! input the current node stays invalid and the enclosing rule stops.

use super::cstring::read_cstring;
use super::cursor::Cursor;
use super::{GdbMi, MiType};

pub(crate) struct Parser<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    pub(crate) fn parse_result_or_value(&mut self, node: &mut GdbMi) {
        self.cursor.skip_spaces();
        self.parse_value(node);
        if node.is_valid() {
            return;
        }
        if self.cursor.at_end() || self.cursor.at(b'(') {
            return;
        }
        let start = self.cursor.pos();
        while let Some(c) = self.cursor.current() {
            if c == b'=' || c == b':' {
                break;
            }
            self.cursor.advance();
        }
        node.name = self.cursor.slice_from(start).trim_end().to_string();
        if self.cursor.at(b'=') {
            self.cursor.advance();
            self.cursor.skip_spaces();
            self.parse_value(node);
        }
    }

    fn parse_value(&mut self, node: &mut GdbMi) {
        match self.cursor.current() {
            Some(b'{') => {
                self.cursor.advance();
                self.parse_tuple_body(node);
            }
            Some(b'[') => self.parse_list(node),
            Some(b'"') => {
                node.kind = MiType::Const;
                node.data = read_cstring(&mut self.cursor);
            }
            _ => {}
        }
    }

    /// Parses tuple fields up to and including the closing brace.
    ///
    /// Also used without an opening brace for top-level records.
    pub(crate) fn parse_tuple_body(&mut self, node: &mut GdbMi) {
        node.kind = MiType::Tuple;
        self.parse_children(node, b'}');
    }

    fn parse_list(&mut self, node: &mut GdbMi) {
        self.cursor.advance();
        node.kind = MiType::List;
        self.parse_children(node, b']');
    }

    fn parse_children(&mut self, node: &mut GdbMi, close: u8) {
        self.cursor.skip_commas();
        while !self.cursor.at_end() {
            if self.cursor.at(close) {
                self.cursor.advance();
                break;
            }
            let mut child = GdbMi::default();
            self.parse_result_or_value(&mut child);
            if !child.is_valid() {
                return;
            }
            node.children.push(child);
            self.cursor.skip_spaces();
            self.cursor.skip_commas();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::GdbMi;

    #[test]
    fn top_level_record_without_braces() {
        let value = GdbMi::parse_multiple(r#"a="1",b={c="2"},d=["x","y"]"#);
        assert!(value.is_valid());
        assert_eq!(value.child_count(), 3);
        assert_eq!(value.get("a").data(), "1");
        assert_eq!(value.get("b").get("c").data(), "2");
        let list = value.get("d");
        assert!(list.is_list());
        assert_eq!(list.child_at(1).map(GdbMi::data), Some("y"));
    }

    #[test]
    fn named_elements_inside_lists() {
        let value = GdbMi::parse(r#"stack=[frame={level="0"},frame={level="1"}]"#);
        assert_eq!(value.name(), "stack");
        assert_eq!(value.child_count(), 2);
        assert!(value.children().iter().all(|child| child.has_name("frame")));
        assert_eq!(value.children()[1].get("level").to_int(), 1);
    }

    #[test]
    fn truncated_input_keeps_parsed_prefix() {
        let value = GdbMi::parse(r#"{a="1",b={c="2",d="#);
        assert_eq!(value.kind(), super::MiType::Tuple);
        assert_eq!(value.get("a").data(), "1");
        let inner = value.get("b");
        assert_eq!(inner.get("c").data(), "2");
        assert!(!inner.get("d").is_valid());
    }

    #[test]
    fn garbage_does_not_hang() {
        for input in ["", "}", "]]]", "=", "((", "{,,,}", "[\"a\" \"b\"]", "ä=ö", "{x:1}"] {
            let _ = GdbMi::parse(input);
            let _ = GdbMi::parse_multiple(input);
        }
    }

    #[test]
    fn spaces_between_tokens_are_ignored() {
        let value = GdbMi::parse(r#"{ a="1", b = "2" }"#);
        assert_eq!(value.get("a").data(), "1");
        assert_eq!(value.get("b").data(), "2");
    }
}
