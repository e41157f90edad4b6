//! Shared types used across the TripLang toolchain: identifiers, source
//! spans, the link error taxonomy, and resolver configuration.

pub mod canonical;
pub mod config;
pub mod error;
pub mod ident;
pub mod parse_error;
pub mod span;

pub use canonical::CanonicalValue;
pub use config::LinkConfig;
pub use error::LinkError;
pub use ident::{LocalName, ModuleName, QualifiedName};
pub use parse_error::ParseError;
pub use span::Span;
