//! Source positions for tokens, tree nodes and diagnostics.

use std::fmt;

/// Where a piece of source text starts, and how many bytes it covers on that
/// line. Lines and columns are 1-indexed; columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub len: u32,
}

impl Span {
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// The span from the start of `self` to the end of `end`.
    ///
    /// Diagnostics only show one line, so when `end` is on a later line the
    /// span stays as it is.
    pub fn through(self, end: Span) -> Span {
        if end.line != self.line {
            return self;
        }
        let stop = (end.col + end.len).max(self.col + self.len);
        Span {
            len: stop - self.col,
            ..self
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_line_and_column() {
        assert_eq!(Span::new(3, 15, 5).to_string(), "3:15");
    }

    #[test]
    fn through_covers_an_operator_expression() {
        // "x + y"
        let span = Span::new(1, 1, 1).through(Span::new(1, 5, 1));
        assert_eq!(span, Span::new(1, 1, 5));
    }

    #[test]
    fn through_stops_at_the_line_end() {
        let start = Span::new(1, 4, 2);
        assert_eq!(start.through(Span::new(3, 1, 6)), start);
    }
}
