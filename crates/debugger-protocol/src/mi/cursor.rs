//! Forward-only cursor over backend output.
//!
//! The grammar's delimiters are all ASCII, so the cursor walks bytes and only
//! needs to care about UTF-8 boundaries when skipping an unexpected character.

pub(crate) struct Cursor<'src> {
    source: &'src str,
    pos: usize,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self { source, pos: 0 }
    }

    /// Returns the byte under the cursor, or `None` at end of input.
    pub(crate) fn current(&self) -> Option<u8> {
        self.look_ahead(0)
    }

    /// Returns the byte `n` positions ahead of the cursor.
    pub(crate) fn look_ahead(&self, n: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + n).copied()
    }

    pub(crate) fn at(&self, byte: u8) -> bool {
        self.current() == Some(byte)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Advances one byte. Only valid when the current byte is ASCII.
    pub(crate) fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// Advances past the whole character under the cursor.
    pub(crate) fn advance_char(&mut self) {
        if let Some(c) = self.source[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    pub(crate) fn skip_spaces(&mut self) {
        while self.current().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    pub(crate) fn skip_commas(&mut self) {
        while self.at(b',') {
            self.pos += 1;
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
    }

    pub(crate) fn bytes(&self) -> &'src [u8] {
        self.source.as_bytes()
    }

    /// Returns the text between `start` and the cursor.
    pub(crate) fn slice_from(&self, start: usize) -> &'src str {
        &self.source[start..self.pos]
    }
}
