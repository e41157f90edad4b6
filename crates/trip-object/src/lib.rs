//! The canonical text codec for `.tripc` object files: a recursive,
//! key-ordered encoding shared with the structural-hash encoder in
//! `trip-subst`, so BigInt-`n`-suffix and sorted-key rules apply uniformly
//! to both hashing and on-disk serialisation.

mod ast_codec;
mod text;

pub mod object;

pub use ast_codec::{decode_definition, decode_poly, decode_ski, decode_type, decode_typed, decode_untyped};
pub use ast_codec::{encode_definition, encode_poly, encode_ski, encode_type, encode_typed, encode_untyped};
pub use object::{ImportEntry, TripCObject};
pub use text::parse_canonical;
