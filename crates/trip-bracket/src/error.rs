use std::fmt;

/// Bracket abstraction only ever runs on definitions the resolver has
/// already closed (spec invariant 5: no free term variables remain once a
/// definition is reachable from `main`). `FreeVariable` exists only to
/// surface a violation of that invariant as a diagnostic instead of a
/// panic, not because abstraction is expected to fail in practice.
#[derive(Debug, Clone, PartialEq)]
pub enum BracketError {
    FreeVariable { name: String },
}

impl fmt::Display for BracketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketError::FreeVariable { name } => {
                write!(f, "cannot abstract to a closed combinator: `{name}` is still free")
            }
        }
    }
}

impl std::error::Error for BracketError {}
