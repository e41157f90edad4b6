//! The AST model shared by the front end, the object codec, and the
//! linker: base types, the four term levels (polymorphic, simply typed,
//! untyped, SKI), and module-level definitions.

pub mod definition;
pub mod term;
pub mod ty;

pub use definition::Definition;
pub use term::{PolyTerm, SKITerm, TypedTerm, UntypedTerm};
pub use ty::BaseType;
