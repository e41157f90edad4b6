use std::fmt;

use crate::span::Span;

/// A fatal error raised while lexing or parsing `.trip` source, or while
/// decoding a `.tripc` object file. Carries the byte span the failure was
/// detected at, not a set of candidate fixes -- unlike `LinkError`, these
/// are shape/syntax failures, not cross-module reasoning failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        ParseError {
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_span_and_message() {
        let err = ParseError::new(Span::new(3, 7), "unexpected token");
        assert_eq!(err.to_string(), "3..7: unexpected token");
    }
}
