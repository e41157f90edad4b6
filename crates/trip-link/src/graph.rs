//! Dependency graph construction (spec §4.5): a best-effort over-approximation
//! of cross-module references, built once before SCC analysis.

use std::collections::{BTreeMap, BTreeSet};

use trip_common::QualifiedName;
use trip_subst::external_refs_of_definition;

use crate::program_space::ProgramSpace;

pub type Graph = BTreeMap<QualifiedName, BTreeSet<QualifiedName>>;

pub fn build_dependency_graph(space: &ProgramSpace) -> Graph {
    let mut edges: Graph = BTreeMap::new();

    for (q, def) in space.terms.iter().chain(space.types.iter()) {
        let (term_refs, type_refs) = external_refs_of_definition(def);
        let mut targets = BTreeSet::new();
        let module = &q.module;

        for n in &term_refs {
            if let Some(target) = space.term_env.get(module).and_then(|env| env.get(n)) {
                targets.insert(target.clone());
            } else {
                let local = QualifiedName::new(module.clone(), n.as_str().into());
                if space.terms.contains_key(&local) {
                    targets.insert(local);
                }
            }
        }
        for n in &type_refs {
            if let Some(target) = space.type_env.get(module).and_then(|env| env.get(n)) {
                targets.insert(target.clone());
            } else {
                let local = QualifiedName::new(module.clone(), n.as_str().into());
                if space.types.contains_key(&local) {
                    targets.insert(local);
                }
            }
        }
        edges.insert(q.clone(), targets);
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trip_ast::{Definition, UntypedTerm};
    use trip_common::{LocalName, ModuleName};
    use trip_object::TripCObject;

    #[test]
    fn local_reference_becomes_an_edge() {
        let object = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                Definition::Untyped {
                    name: LocalName::new("f"),
                    term: Arc::new(UntypedTerm::Var("g".into())),
                },
                Definition::Untyped {
                    name: LocalName::new("g"),
                    term: Arc::new(UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Var("x".into())))),
                },
            ],
        )
        .unwrap();
        let space = ProgramSpace::build(vec![object]).unwrap();
        let graph = build_dependency_graph(&space);
        let f = QualifiedName::new(ModuleName::new("A"), LocalName::new("f"));
        let g = QualifiedName::new(ModuleName::new("A"), LocalName::new("g"));
        assert!(graph[&f].contains(&g));
        assert!(graph[&g].is_empty());
    }
}
