//! Lowering ladder (spec §4.9): the erasure steps poly -> typed -> untyped,
//! and the final untyped -> combinator step via bracket abstraction.

use std::sync::Arc;

use trip_ast::{Definition, PolyTerm, SKITerm, TypedTerm, UntypedTerm};
use trip_bracket::bracket_abstract;
use trip_common::{LinkError, QualifiedName};

/// Erase a `PolyTerm` to a `TypedTerm`: type abstractions and type
/// applications are transparent at this level.
pub fn erase_poly_to_typed(term: &PolyTerm) -> Arc<TypedTerm> {
    match term {
        PolyTerm::Var(name) => Arc::new(TypedTerm::Var(name.clone())),
        PolyTerm::Abs(name, ann, body) => Arc::new(TypedTerm::Abs(name.clone(), ann.clone(), erase_poly_to_typed(body))),
        PolyTerm::TAbs(_, body) => erase_poly_to_typed(body),
        PolyTerm::TypeApp(inner, _) => erase_poly_to_typed(inner),
        PolyTerm::App(l, r) => Arc::new(TypedTerm::App(erase_poly_to_typed(l), erase_poly_to_typed(r))),
    }
}

/// Erase a `TypedTerm` to an `UntypedTerm`: drop parameter annotations.
pub fn erase_typed_to_untyped(term: &TypedTerm) -> Arc<UntypedTerm> {
    match term {
        TypedTerm::Var(name) => Arc::new(UntypedTerm::Var(name.clone())),
        TypedTerm::Abs(name, _, body) => Arc::new(UntypedTerm::Abs(name.clone(), erase_typed_to_untyped(body))),
        TypedTerm::App(l, r) => Arc::new(UntypedTerm::App(erase_typed_to_untyped(l), erase_typed_to_untyped(r))),
    }
}

/// The resolver's pre-step: rewrite every `Poly`/`Typed` definition to an
/// `Untyped` one. `Untyped`, `Combinator`, and `Type` pass through.
pub fn lower_to_untyped(def: &Definition) -> Definition {
    match def {
        Definition::Poly { name, term, .. } => Definition::Untyped {
            name: name.clone(),
            term: erase_typed_to_untyped(&erase_poly_to_typed(term)),
        },
        Definition::Typed { name, term, .. } => Definition::Untyped {
            name: name.clone(),
            term: erase_typed_to_untyped(term),
        },
        other => other.clone(),
    }
}

/// Lower a closed definition all the way down to a combinator expression.
/// `q` is only used to label a `LoweringCap` failure.
pub fn lower_to_combinator(def: &Definition, q: &QualifiedName) -> Result<Arc<SKITerm>, LinkError> {
    let untyped = match def {
        Definition::Combinator { term, .. } => return Ok(term.clone()),
        Definition::Poly { term, .. } => erase_typed_to_untyped(&erase_poly_to_typed(term)),
        Definition::Typed { term, .. } => erase_typed_to_untyped(term),
        Definition::Untyped { term, .. } => term.clone(),
        _ => {
            return Err(LinkError::LoweringCap {
                def: q.clone(),
                steps: 0,
            })
        }
    };
    bracket_abstract(&untyped).map_err(|_| LinkError::LoweringCap { def: q.clone(), steps: 3 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_ast::ty::BaseType;
    use trip_common::{LocalName, ModuleName};

    #[test]
    fn poly_identity_lowers_to_i() {
        // ΛX. λx:X. x
        let term = Arc::new(PolyTerm::TAbs(
            "X".into(),
            Arc::new(PolyTerm::Abs("x".into(), BaseType::var("X"), Arc::new(PolyTerm::Var("x".into())))),
        ));
        let def = Definition::Poly {
            name: LocalName::new("main"),
            ty: None,
            term,
            rec: false,
        };
        let q = QualifiedName::new(ModuleName::new("A"), LocalName::new("main"));
        let ski = lower_to_combinator(&def, &q).unwrap();
        assert_eq!(*ski, SKITerm::I);
    }

    #[test]
    fn combinator_definition_passes_through_unchanged() {
        let def = Definition::Combinator {
            name: LocalName::new("id"),
            term: Arc::new(SKITerm::I),
        };
        let q = QualifiedName::new(ModuleName::new("A"), LocalName::new("id"));
        let ski = lower_to_combinator(&def, &q).unwrap();
        assert_eq!(*ski, SKITerm::I);
    }
}
