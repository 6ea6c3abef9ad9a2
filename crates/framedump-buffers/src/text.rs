//! Line-oriented reading helpers shared by the text dump parsers.

/// A peekable, whitespace-trimming line reader over a dump file's contents.
///
/// The header, element-block and vertex-data parsers all hand the same
/// reader around so that each consumes exactly the lines it owns.
pub(crate) struct LineReader<'a> {
    lines: std::str::Lines<'a>,
    peeked: Option<&'a str>,
}

impl<'a> LineReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            peeked: None,
        }
    }

    /// Next line, trimmed. `None` at end of input.
    pub fn next(&mut self) -> Option<&'a str> {
        if let Some(line) = self.peeked.take() {
            return Some(line);
        }
        self.lines.next().map(str::trim)
    }

    /// Peek at the next trimmed line without consuming it.
    pub fn peek(&mut self) -> Option<&'a str> {
        if self.peeked.is_none() {
            self.peeked = self.lines.next().map(str::trim);
        }
        self.peeked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_peeks() {
        let mut r = LineReader::new("  a \nb\n\nc");
        assert_eq!(r.peek(), Some("a"));
        assert_eq!(r.next(), Some("a"));
        assert_eq!(r.next(), Some("b"));
        assert_eq!(r.next(), Some(""));
        assert_eq!(r.next(), Some("c"));
        assert_eq!(r.next(), None);
    }
}
