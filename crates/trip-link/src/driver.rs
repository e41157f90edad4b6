//! The link driver (spec §4.10): ties program-space construction, data
//! expansion, cross-module resolution, `main` location, and the lowering
//! ladder together into a single entry point.

use std::sync::Arc;

use log::debug;

use trip_ast::SKITerm;
use trip_common::{LinkConfig, LinkError, LocalName, ModuleName, QualifiedName};
use trip_object::TripCObject;

use crate::data_expand::expand_data_declarations;
use crate::ladder::lower_to_combinator;
use crate::program_space::ProgramSpace;
use crate::resolver::resolve_cross_module_dependencies;

/// `link(modules) = lowerToSKI(findMain(resolve(space(load(modules)))))`.
pub fn link(objects: Vec<TripCObject>, config: &LinkConfig) -> Result<Arc<SKITerm>, LinkError> {
    debug!("building program space from {} module(s)", objects.len());
    let mut space = ProgramSpace::build(objects)?;

    debug!("expanding data declarations");
    expand_data_declarations(&mut space)?;

    debug!("resolving cross-module dependencies");
    resolve_cross_module_dependencies(&mut space, config)?;

    let (q, def) = locate_main(&space)?;
    debug!("lowering `{q}` to a combinator expression");
    lower_to_combinator(&def, &q)
}

/// Find the unique module exporting `main` and return its (now fully
/// resolved) definition.
fn locate_main(space: &ProgramSpace) -> Result<(QualifiedName, trip_ast::Definition), LinkError> {
    let main: LocalName = LocalName::new("main");
    let exporters: Vec<&ModuleName> = space
        .modules
        .values()
        .filter(|m| m.exports.contains(main.as_str()))
        .map(|m| &m.name)
        .collect();

    match exporters.as_slice() {
        [] => Err(LinkError::NoMain),
        [only] => {
            let q = QualifiedName::new((*only).clone(), main);
            if space.types.contains_key(&q) {
                return Err(LinkError::MainIsType { module: (*only).clone() });
            }
            let def = space
                .terms
                .get(&q)
                .cloned()
                .ok_or_else(|| LinkError::NoMain)?;
            Ok((q, def))
        }
        many => Err(LinkError::AmbiguousMain {
            exporters: many.iter().map(|m| (*m).clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_ast::{Definition, UntypedTerm};
    use trip_common::LinkConfig;

    fn untyped(name: &str, term: UntypedTerm) -> Definition {
        Definition::Untyped {
            name: LocalName::new(name),
            term: Arc::new(term),
        }
    }

    #[test]
    fn links_a_single_module_identity_main() {
        let object = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                untyped("main", UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Var("x".into())))),
                Definition::Export { name: LocalName::new("main") },
            ],
        )
        .unwrap();
        let ski = link(vec![object], &LinkConfig::default()).unwrap();
        assert_eq!(*ski, SKITerm::I);
    }

    #[test]
    fn no_exporter_of_main_is_rejected() {
        let object = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![untyped("helper", UntypedTerm::Var("helper".into()))],
        )
        .unwrap();
        let err = link(vec![object], &LinkConfig::default()).unwrap_err();
        assert!(matches!(err, LinkError::NoMain));
    }

    #[test]
    fn ambiguous_main_across_modules_is_rejected() {
        let a = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                untyped("main", UntypedTerm::Var("main".into())),
                Definition::Export { name: LocalName::new("main") },
            ],
        )
        .unwrap();
        let b = TripCObject::from_definitions(
            ModuleName::new("B"),
            vec![
                untyped("main", UntypedTerm::Var("main".into())),
                Definition::Export { name: LocalName::new("main") },
            ],
        )
        .unwrap();
        let err = link(vec![a, b], &LinkConfig::default()).unwrap_err();
        assert!(matches!(err, LinkError::AmbiguousMain { .. }));
    }

    #[test]
    fn a_rec_self_referential_main_still_lowers_to_a_closed_ski_term() {
        use trip_ast::{ty::BaseType, PolyTerm};
        let object = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                Definition::Poly {
                    name: LocalName::new("main"),
                    ty: None,
                    term: Arc::new(PolyTerm::Abs(
                        "x".into(),
                        BaseType::var("X"),
                        Arc::new(PolyTerm::App(
                            Arc::new(PolyTerm::Var("main".into())),
                            Arc::new(PolyTerm::Var("x".into())),
                        )),
                    )),
                    rec: true,
                },
                Definition::Export { name: LocalName::new("main") },
            ],
        )
        .unwrap();
        // Would previously fail bracket abstraction with a dangling free
        // `main` once the `rec` carve-out stopped the substitution loop
        // from trying to inline it; the resolver now closes that
        // self-reference with a fixed-point combinator instead.
        link(vec![object], &LinkConfig::default()).unwrap();
    }

    #[test]
    fn main_bound_to_a_type_alias_is_rejected() {
        use trip_ast::ty::BaseType;
        let object = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                Definition::Type {
                    name: LocalName::new("main"),
                    ty: BaseType::var("X"),
                },
                Definition::Export { name: LocalName::new("main") },
            ],
        )
        .unwrap();
        let err = link(vec![object], &LinkConfig::default()).unwrap_err();
        assert!(matches!(err, LinkError::MainIsType { .. }));
    }
}
