//! External-reference scanner (spec §4.2): collects the term and type
//! names that occur free in a term.
//!
//! Each scan is memoised by the pointer identity of the `Arc` node being
//! visited. The substitution engine guarantees that an unchanged subtree
//! comes back as the *same* `Arc` (see `subst.rs`), so two definitions that
//! happen to share a cached subtree within one resolver pass get the cache
//! hit for free. The cache is scoped to a single top-level call -- it holds
//! no weak references and is dropped with the call, so there's no risk of a
//! freed allocation's address being reused under our feet.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use trip_ast::ty::BaseType;
use trip_ast::{Definition, PolyTerm, TypedTerm, UntypedTerm};

/// `(term names free in this node, type names free in this node)`.
pub type RefSets = (BTreeSet<String>, BTreeSet<String>);

fn union(mut a: RefSets, b: &RefSets) -> RefSets {
    a.0.extend(b.0.iter().cloned());
    a.1.extend(b.1.iter().cloned());
    a
}

struct Scanner {
    poly: FxHashMap<usize, Arc<RefSets>>,
    typed: FxHashMap<usize, Arc<RefSets>>,
    untyped: FxHashMap<usize, Arc<RefSets>>,
    ty: FxHashMap<usize, Arc<BTreeSet<String>>>,
}

impl Scanner {
    fn new() -> Self {
        Scanner {
            poly: FxHashMap::default(),
            typed: FxHashMap::default(),
            untyped: FxHashMap::default(),
            ty: FxHashMap::default(),
        }
    }

    fn type_refs(&mut self, ty: &Arc<BaseType>) -> Arc<BTreeSet<String>> {
        let key = Arc::as_ptr(ty) as usize;
        if let Some(cached) = self.ty.get(&key) {
            return cached.clone();
        }
        let result = match ty.as_ref() {
            BaseType::TypeVar(name) => BTreeSet::from([name.clone()]),
            BaseType::Arrow(l, r) | BaseType::TypeApp(l, r) => {
                let mut set = (*self.type_refs(l)).clone();
                set.extend(self.type_refs(r).iter().cloned());
                set
            }
            BaseType::Forall(var, body) => {
                let mut set = (*self.type_refs(body)).clone();
                set.remove(var);
                set
            }
        };
        let result = Arc::new(result);
        self.ty.insert(key, result.clone());
        result
    }

    fn poly_refs(&mut self, term: &Arc<PolyTerm>) -> Arc<RefSets> {
        let key = Arc::as_ptr(term) as usize;
        if let Some(cached) = self.poly.get(&key) {
            return cached.clone();
        }
        let result = match term.as_ref() {
            PolyTerm::Var(name) => (BTreeSet::from([name.clone()]), BTreeSet::new()),
            PolyTerm::Abs(name, ann, body) => {
                let ann_types = self.type_refs(ann);
                let body_refs = self.poly_refs(body);
                let mut terms = body_refs.0.clone();
                terms.remove(name);
                let mut types = body_refs.1.clone();
                types.extend(ann_types.iter().cloned());
                (terms, types)
            }
            PolyTerm::TAbs(v, body) => {
                let body_refs = self.poly_refs(body);
                let mut types = body_refs.1.clone();
                types.remove(v);
                (body_refs.0.clone(), types)
            }
            PolyTerm::TypeApp(inner, arg) => {
                let inner_refs = (*self.poly_refs(inner)).clone();
                union(inner_refs, &(BTreeSet::new(), (*self.type_refs(arg)).clone()))
            }
            PolyTerm::App(l, r) => {
                let l_refs = (*self.poly_refs(l)).clone();
                union(l_refs, &self.poly_refs(r))
            }
        };
        let result = Arc::new(result);
        self.poly.insert(key, result.clone());
        result
    }

    fn typed_refs(&mut self, term: &Arc<TypedTerm>) -> Arc<RefSets> {
        let key = Arc::as_ptr(term) as usize;
        if let Some(cached) = self.typed.get(&key) {
            return cached.clone();
        }
        let result = match term.as_ref() {
            TypedTerm::Var(name) => (BTreeSet::from([name.clone()]), BTreeSet::new()),
            TypedTerm::Abs(name, ann, body) => {
                let ann_types = self.type_refs(ann);
                let body_refs = self.typed_refs(body);
                let mut terms = body_refs.0.clone();
                terms.remove(name);
                let mut types = body_refs.1.clone();
                types.extend(ann_types.iter().cloned());
                (terms, types)
            }
            TypedTerm::App(l, r) => {
                let l_refs = (*self.typed_refs(l)).clone();
                union(l_refs, &self.typed_refs(r))
            }
        };
        let result = Arc::new(result);
        self.typed.insert(key, result.clone());
        result
    }

    fn untyped_refs(&mut self, term: &Arc<UntypedTerm>) -> Arc<RefSets> {
        let key = Arc::as_ptr(term) as usize;
        if let Some(cached) = self.untyped.get(&key) {
            return cached.clone();
        }
        let result = match term.as_ref() {
            UntypedTerm::Var(name) => (BTreeSet::from([name.clone()]), BTreeSet::new()),
            UntypedTerm::Abs(name, body) => {
                let body_refs = self.untyped_refs(body);
                let mut terms = body_refs.0.clone();
                terms.remove(name);
                (terms, body_refs.1.clone())
            }
            UntypedTerm::App(l, r) => {
                let l_refs = (*self.untyped_refs(l)).clone();
                union(l_refs, &self.untyped_refs(r))
            }
        };
        let result = Arc::new(result);
        self.untyped.insert(key, result.clone());
        result
    }
}

pub fn external_refs_type(ty: &Arc<BaseType>) -> BTreeSet<String> {
    (*Scanner::new().type_refs(ty)).clone()
}

pub fn external_refs_poly(term: &Arc<PolyTerm>) -> RefSets {
    (*Scanner::new().poly_refs(term)).clone()
}

pub fn external_refs_typed(term: &Arc<TypedTerm>) -> RefSets {
    (*Scanner::new().typed_refs(term)).clone()
}

pub fn external_refs_untyped(term: &Arc<UntypedTerm>) -> RefSets {
    (*Scanner::new().untyped_refs(term)).clone()
}

/// `externalRefs(value(def))`, dispatched by definition kind, with the
/// `rec=true` self-reference carve-out (spec §4.7 step 2) applied by the
/// caller -- this function reports raw free references only.
pub fn external_refs_of_definition(def: &Definition) -> RefSets {
    match def {
        Definition::Poly { term, .. } => external_refs_poly(term),
        Definition::Typed { term, .. } => external_refs_typed(term),
        Definition::Untyped { term, .. } => external_refs_untyped(term),
        Definition::Combinator { .. } => (BTreeSet::new(), BTreeSet::new()),
        Definition::Type { ty, .. } => (BTreeSet::new(), external_refs_type(ty)),
        Definition::Data {
            type_params,
            constructors,
            ..
        } => {
            let mut types = BTreeSet::new();
            for (_, fields) in constructors {
                for field in fields {
                    types.extend(external_refs_type(field));
                }
            }
            for param in type_params {
                types.remove(param);
            }
            (BTreeSet::new(), types)
        }
        Definition::Module { .. } | Definition::Import { .. } | Definition::Export { .. } => {
            (BTreeSet::new(), BTreeSet::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstraction_removes_bound_name_but_keeps_annotation_type_refs() {
        // \x:T. y
        let term = Arc::new(TypedTerm::Abs(
            "x".into(),
            BaseType::var("T"),
            Arc::new(TypedTerm::Var("y".into())),
        ));
        let (terms, types) = external_refs_typed(&term);
        assert_eq!(terms, BTreeSet::from(["y".to_string()]));
        assert_eq!(types, BTreeSet::from(["T".to_string()]));
    }

    #[test]
    fn tabs_only_removes_from_type_refs() {
        // /\X. \x:X. foo
        let term = Arc::new(PolyTerm::TAbs(
            "X".into(),
            Arc::new(PolyTerm::Abs(
                "x".into(),
                BaseType::var("X"),
                Arc::new(PolyTerm::Var("foo".into())),
            )),
        ));
        let (terms, types) = external_refs_poly(&term);
        assert_eq!(terms, BTreeSet::from(["foo".to_string()]));
        assert!(types.is_empty());
    }

    #[test]
    fn forall_removes_bound_type_var() {
        let ty = BaseType::forall("X", BaseType::arrow(BaseType::var("X"), BaseType::var("Y")));
        assert_eq!(external_refs_type(&ty), BTreeSet::from(["Y".to_string()]));
    }
}
