//! De Bruijn normalisation, external-reference scanning, and hygienic
//! substitution over TripLang's term levels.

pub mod free_vars;
pub mod normalize;
pub mod subst;

pub use free_vars::{
    external_refs_of_definition, external_refs_poly, external_refs_type, external_refs_typed, external_refs_untyped,
    RefSets,
};
pub use normalize::{structural_hash_of_definition, NormalForm};
pub use subst::{
    fresh_name, subst_definition_type, subst_definition_untyped_batch, subst_poly_batch, subst_type,
    subst_type_in_poly, subst_type_in_typed, subst_typed_batch, subst_untyped, subst_untyped_batch,
    union_free_term_vars_untyped,
};
