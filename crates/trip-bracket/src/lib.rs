//! Bracket abstraction from untyped lambda terms to closed SKI expressions,
//! plus a small reducer used only to check that abstraction's output.

mod abstraction;
mod error;
mod reduce;

pub use abstraction::{bracket_abstract, ski_to_untyped};
pub use error::BracketError;
pub use reduce::reduce;
