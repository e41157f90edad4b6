use std::fmt;

/// A byte-offset range into a single source file.
///
/// Produced by the lexer and parser, threaded through `ParseError` for
/// diagnostics. Not meaningful once a module has been loaded from an
/// object file -- object files carry no source-map information (see the
/// Non-goals around source-map preservation).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
