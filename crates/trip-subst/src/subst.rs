//! The hygienic substitution engine (spec §4.3): capture-avoiding single and
//! batched substitution across the three term levels that carry variable
//! names (Poly, Typed, Untyped -- SKI terms are name-free by construction)
//! and over `BaseType`.
//!
//! Every rebuilder returns the *original* `Arc` when a subtree is
//! unchanged (`Arc::ptr_eq` on the input equals the output), never a fresh
//! allocation with equal contents. The resolver's fixpoint loop and the
//! free-variable cache both depend on that identity being preserved.

use std::collections::BTreeMap;
use std::sync::Arc;

use std::collections::BTreeSet;

use trip_ast::ty::BaseType;
use trip_ast::{Definition, PolyTerm, TypedTerm, UntypedTerm};

use crate::free_vars::{external_refs_poly, external_refs_type, external_refs_typed, external_refs_untyped};

/// Generate a name not in `avoid`, preferring `base` itself. TripLang's
/// lexer never produces `#` in an identifier, so a counter-suffixed name
/// can never collide with anything the front end parsed.
pub fn fresh_name(base: &str, avoid: &BTreeSet<String>) -> String {
    if !avoid.contains(base) {
        return base.to_string();
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}#{n}");
        if !avoid.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// ── Types ────────────────────────────────────────────────────────────────

/// `substType(t, name, u)` over a `BaseType`.
pub fn subst_type(ty: &Arc<BaseType>, name: &str, u: &Arc<BaseType>) -> Arc<BaseType> {
    let u_fv = external_refs_type(u);
    subst_type_inner(ty, name, u, &u_fv)
}

fn subst_type_inner(ty: &Arc<BaseType>, name: &str, u: &Arc<BaseType>, u_fv: &BTreeSet<String>) -> Arc<BaseType> {
    match ty.as_ref() {
        BaseType::TypeVar(n) => {
            if n == name {
                u.clone()
            } else {
                ty.clone()
            }
        }
        BaseType::Arrow(l, r) => {
            let nl = subst_type_inner(l, name, u, u_fv);
            let nr = subst_type_inner(r, name, u, u_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                ty.clone()
            } else {
                Arc::new(BaseType::Arrow(nl, nr))
            }
        }
        BaseType::TypeApp(l, r) => {
            let nl = subst_type_inner(l, name, u, u_fv);
            let nr = subst_type_inner(r, name, u, u_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                ty.clone()
            } else {
                Arc::new(BaseType::TypeApp(nl, nr))
            }
        }
        BaseType::Forall(v, body) => {
            // Invariant (spec §3): a Forall binding the same name the
            // substitution targets is a no-op on that subtree.
            if v == name {
                return ty.clone();
            }
            if u_fv.contains(v) {
                let mut avoid = u_fv.clone();
                avoid.extend(external_refs_type(body));
                let fresh = fresh_name(v, &avoid);
                let renamed_body =
                    subst_type_inner(body, v, &BaseType::var(fresh.clone()), &BTreeSet::from([fresh.clone()]));
                let new_body = subst_type_inner(&renamed_body, name, u, u_fv);
                Arc::new(BaseType::Forall(fresh, new_body))
            } else {
                let new_body = subst_type_inner(body, name, u, u_fv);
                if Arc::ptr_eq(&new_body, body) {
                    ty.clone()
                } else {
                    Arc::new(BaseType::Forall(v.clone(), new_body))
                }
            }
        }
    }
}

/// Propagate `substType` into a `Poly` term's annotations and type
/// applications.
pub fn subst_type_in_poly(term: &Arc<PolyTerm>, name: &str, u: &Arc<BaseType>) -> Arc<PolyTerm> {
    let u_fv = external_refs_type(u);
    subst_type_in_poly_inner(term, name, u, &u_fv)
}

fn subst_type_in_poly_inner(
    term: &Arc<PolyTerm>,
    name: &str,
    u: &Arc<BaseType>,
    u_fv: &BTreeSet<String>,
) -> Arc<PolyTerm> {
    match term.as_ref() {
        PolyTerm::Var(_) => term.clone(),
        PolyTerm::Abs(n, ann, body) => {
            let new_ann = subst_type_inner(ann, name, u, u_fv);
            let new_body = subst_type_in_poly_inner(body, name, u, u_fv);
            if Arc::ptr_eq(&new_ann, ann) && Arc::ptr_eq(&new_body, body) {
                term.clone()
            } else {
                Arc::new(PolyTerm::Abs(n.clone(), new_ann, new_body))
            }
        }
        PolyTerm::TAbs(v, body) => {
            if v == name {
                return term.clone();
            }
            if u_fv.contains(v) {
                let mut avoid = u_fv.clone();
                avoid.extend(external_refs_poly(body).1);
                let fresh = fresh_name(v, &avoid);
                let renamed_body =
                    subst_type_in_poly_inner(body, v, &BaseType::var(fresh.clone()), &BTreeSet::from([fresh.clone()]));
                let new_body = subst_type_in_poly_inner(&renamed_body, name, u, u_fv);
                Arc::new(PolyTerm::TAbs(fresh, new_body))
            } else {
                let new_body = subst_type_in_poly_inner(body, name, u, u_fv);
                if Arc::ptr_eq(&new_body, body) {
                    term.clone()
                } else {
                    Arc::new(PolyTerm::TAbs(v.clone(), new_body))
                }
            }
        }
        PolyTerm::TypeApp(inner, arg) => {
            let new_inner = subst_type_in_poly_inner(inner, name, u, u_fv);
            let new_arg = subst_type_inner(arg, name, u, u_fv);
            if Arc::ptr_eq(&new_inner, inner) && Arc::ptr_eq(&new_arg, arg) {
                term.clone()
            } else {
                Arc::new(PolyTerm::TypeApp(new_inner, new_arg))
            }
        }
        PolyTerm::App(l, r) => {
            let nl = subst_type_in_poly_inner(l, name, u, u_fv);
            let nr = subst_type_in_poly_inner(r, name, u, u_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                term.clone()
            } else {
                Arc::new(PolyTerm::App(nl, nr))
            }
        }
    }
}

/// Propagate `substType` into a `Typed` term's annotations.
pub fn subst_type_in_typed(term: &Arc<TypedTerm>, name: &str, u: &Arc<BaseType>) -> Arc<TypedTerm> {
    let u_fv = external_refs_type(u);
    subst_type_in_typed_inner(term, name, u, &u_fv)
}

fn subst_type_in_typed_inner(
    term: &Arc<TypedTerm>,
    name: &str,
    u: &Arc<BaseType>,
    u_fv: &BTreeSet<String>,
) -> Arc<TypedTerm> {
    match term.as_ref() {
        TypedTerm::Var(_) => term.clone(),
        TypedTerm::Abs(n, ann, body) => {
            let new_ann = subst_type_inner(ann, name, u, u_fv);
            let new_body = subst_type_in_typed_inner(body, name, u, u_fv);
            if Arc::ptr_eq(&new_ann, ann) && Arc::ptr_eq(&new_body, body) {
                term.clone()
            } else {
                Arc::new(TypedTerm::Abs(n.clone(), new_ann, new_body))
            }
        }
        TypedTerm::App(l, r) => {
            let nl = subst_type_in_typed_inner(l, name, u, u_fv);
            let nr = subst_type_in_typed_inner(r, name, u, u_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                term.clone()
            } else {
                Arc::new(TypedTerm::App(nl, nr))
            }
        }
    }
}

// ── Terms ────────────────────────────────────────────────────────────────

pub fn subst_poly_batch(
    term: &Arc<PolyTerm>,
    subs: &BTreeMap<String, Arc<PolyTerm>>,
    union_fv: &BTreeSet<String>,
) -> Arc<PolyTerm> {
    if subs.is_empty() {
        return term.clone();
    }
    match term.as_ref() {
        PolyTerm::Var(name) => match subs.get(name) {
            Some(replacement) => replacement.clone(),
            None => term.clone(),
        },
        PolyTerm::Abs(name, ann, body) => {
            let mut applicable = subs.clone();
            applicable.remove(name);
            if union_fv.contains(name) {
                let mut avoid = union_fv.clone();
                avoid.extend(external_refs_poly(body).0);
                let fresh = fresh_name(name, &avoid);
                let rename: BTreeMap<String, Arc<PolyTerm>> =
                    BTreeMap::from([(name.clone(), Arc::new(PolyTerm::Var(fresh.clone())))]);
                let renamed_body = subst_poly_batch(body, &rename, &BTreeSet::from([fresh.clone()]));
                let new_body = subst_poly_batch(&renamed_body, &applicable, union_fv);
                Arc::new(PolyTerm::Abs(fresh, ann.clone(), new_body))
            } else {
                let new_body = subst_poly_batch(body, &applicable, union_fv);
                if Arc::ptr_eq(&new_body, body) {
                    term.clone()
                } else {
                    Arc::new(PolyTerm::Abs(name.clone(), ann.clone(), new_body))
                }
            }
        }
        PolyTerm::TAbs(v, body) => {
            // Type-variable binder; term-level substitution passes through.
            let new_body = subst_poly_batch(body, subs, union_fv);
            if Arc::ptr_eq(&new_body, body) {
                term.clone()
            } else {
                Arc::new(PolyTerm::TAbs(v.clone(), new_body))
            }
        }
        PolyTerm::TypeApp(inner, arg) => {
            let new_inner = subst_poly_batch(inner, subs, union_fv);
            if Arc::ptr_eq(&new_inner, inner) {
                term.clone()
            } else {
                Arc::new(PolyTerm::TypeApp(new_inner, arg.clone()))
            }
        }
        PolyTerm::App(l, r) => {
            let nl = subst_poly_batch(l, subs, union_fv);
            let nr = subst_poly_batch(r, subs, union_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                term.clone()
            } else {
                Arc::new(PolyTerm::App(nl, nr))
            }
        }
    }
}

pub fn subst_typed_batch(
    term: &Arc<TypedTerm>,
    subs: &BTreeMap<String, Arc<TypedTerm>>,
    union_fv: &BTreeSet<String>,
) -> Arc<TypedTerm> {
    if subs.is_empty() {
        return term.clone();
    }
    match term.as_ref() {
        TypedTerm::Var(name) => match subs.get(name) {
            Some(replacement) => replacement.clone(),
            None => term.clone(),
        },
        TypedTerm::Abs(name, ann, body) => {
            let mut applicable = subs.clone();
            applicable.remove(name);
            if union_fv.contains(name) {
                let mut avoid = union_fv.clone();
                avoid.extend(external_refs_typed(body).0);
                let fresh = fresh_name(name, &avoid);
                let rename: BTreeMap<String, Arc<TypedTerm>> =
                    BTreeMap::from([(name.clone(), Arc::new(TypedTerm::Var(fresh.clone())))]);
                let renamed_body = subst_typed_batch(body, &rename, &BTreeSet::from([fresh.clone()]));
                let new_body = subst_typed_batch(&renamed_body, &applicable, union_fv);
                Arc::new(TypedTerm::Abs(fresh, ann.clone(), new_body))
            } else {
                let new_body = subst_typed_batch(body, &applicable, union_fv);
                if Arc::ptr_eq(&new_body, body) {
                    term.clone()
                } else {
                    Arc::new(TypedTerm::Abs(name.clone(), ann.clone(), new_body))
                }
            }
        }
        TypedTerm::App(l, r) => {
            let nl = subst_typed_batch(l, subs, union_fv);
            let nr = subst_typed_batch(r, subs, union_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                term.clone()
            } else {
                Arc::new(TypedTerm::App(nl, nr))
            }
        }
    }
}

pub fn subst_untyped_batch(
    term: &Arc<UntypedTerm>,
    subs: &BTreeMap<String, Arc<UntypedTerm>>,
    union_fv: &BTreeSet<String>,
) -> Arc<UntypedTerm> {
    if subs.is_empty() {
        return term.clone();
    }
    match term.as_ref() {
        UntypedTerm::Var(name) => match subs.get(name) {
            Some(replacement) => replacement.clone(),
            None => term.clone(),
        },
        UntypedTerm::Abs(name, body) => {
            let mut applicable = subs.clone();
            applicable.remove(name);
            if union_fv.contains(name) {
                let mut avoid = union_fv.clone();
                avoid.extend(external_refs_untyped(body).0);
                let fresh = fresh_name(name, &avoid);
                let rename: BTreeMap<String, Arc<UntypedTerm>> =
                    BTreeMap::from([(name.clone(), Arc::new(UntypedTerm::Var(fresh.clone())))]);
                let renamed_body = subst_untyped_batch(body, &rename, &BTreeSet::from([fresh.clone()]));
                let new_body = subst_untyped_batch(&renamed_body, &applicable, union_fv);
                Arc::new(UntypedTerm::Abs(fresh, new_body))
            } else {
                let new_body = subst_untyped_batch(body, &applicable, union_fv);
                if Arc::ptr_eq(&new_body, body) {
                    term.clone()
                } else {
                    Arc::new(UntypedTerm::Abs(name.clone(), new_body))
                }
            }
        }
        UntypedTerm::App(l, r) => {
            let nl = subst_untyped_batch(l, subs, union_fv);
            let nr = subst_untyped_batch(r, subs, union_fv);
            if Arc::ptr_eq(&nl, l) && Arc::ptr_eq(&nr, r) {
                term.clone()
            } else {
                Arc::new(UntypedTerm::App(nl, nr))
            }
        }
    }
}

/// Single-substitution convenience wrapper over `subst_untyped_batch`.
pub fn subst_untyped(term: &Arc<UntypedTerm>, name: &str, v: &Arc<UntypedTerm>) -> Arc<UntypedTerm> {
    let union_fv = external_refs_untyped(v).0;
    let subs = BTreeMap::from([(name.to_string(), v.clone())]);
    subst_untyped_batch(term, &subs, &union_fv)
}

/// Compute the union of free term variables across a batch of
/// replacements, as required by `substTermBatch`'s `unionFV` parameter.
pub fn union_free_term_vars_untyped<'a>(values: impl IntoIterator<Item = &'a Arc<UntypedTerm>>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for v in values {
        out.extend(external_refs_untyped(v).0);
    }
    out
}

// ── Definition-level wrappers ────────────────────────────────────────────

/// Apply a batch of untyped-term substitutions to an `Untyped` definition's
/// value, rebuilding only the value component. Any other definition kind
/// has no untyped-term value to substitute into and is returned unchanged
/// -- by the time the resolver calls this, every term-kind definition has
/// already gone through the poly/typed -> untyped pre-lowering step.
pub fn subst_definition_untyped_batch(
    def: &Definition,
    subs: &BTreeMap<String, Arc<UntypedTerm>>,
    union_fv: &BTreeSet<String>,
) -> Definition {
    match def {
        Definition::Untyped { name, term } => Definition::Untyped {
            name: name.clone(),
            term: subst_untyped_batch(term, subs, union_fv),
        },
        other => other.clone(),
    }
}

/// Apply a single type substitution to a `Type` alias's body, or to a
/// `Data` declaration's constructor field types. Other kinds pass through.
pub fn subst_definition_type(def: &Definition, name: &str, u: &Arc<BaseType>) -> Definition {
    match def {
        Definition::Type { name: n, ty } => Definition::Type {
            name: n.clone(),
            ty: subst_type(ty, name, u),
        },
        Definition::Data {
            name: n,
            type_params,
            constructors,
        } => Definition::Data {
            name: n.clone(),
            type_params: type_params.clone(),
            constructors: constructors
                .iter()
                .map(|(ctor, fields)| {
                    (
                        ctor.clone(),
                        fields.iter().map(|f| subst_type(f, name, u)).collect(),
                    )
                })
                .collect(),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Arc<UntypedTerm> {
        Arc::new(UntypedTerm::Var(name.to_string()))
    }

    fn app(l: Arc<UntypedTerm>, r: Arc<UntypedTerm>) -> Arc<UntypedTerm> {
        Arc::new(UntypedTerm::App(l, r))
    }

    fn abs(name: &str, body: Arc<UntypedTerm>) -> Arc<UntypedTerm> {
        Arc::new(UntypedTerm::Abs(name.to_string(), body))
    }

    #[test]
    fn identity_preserved_when_no_change() {
        // f x, substituting y (absent) for z: both subtrees come back as
        // the very same Arc.
        let term = app(var("f"), var("x"));
        let replaced = subst_untyped(&term, "y", &var("z"));
        assert!(Arc::ptr_eq(&term, &replaced));
    }

    #[test]
    fn capture_avoided_by_renaming_binder() {
        // (\x. y)[y := x] must not turn into (\x. x); the binder is
        // renamed so the substituted `x` stays free.
        let term = abs("x", var("y"));
        let result = subst_untyped(&term, "y", &var("x"));
        match result.as_ref() {
            UntypedTerm::Abs(bound, body) => {
                assert_ne!(bound, "x");
                match body.as_ref() {
                    UntypedTerm::Var(v) => assert_eq!(v, "x"),
                    _ => panic!("expected a variable body"),
                }
            }
            _ => panic!("expected an abstraction"),
        }
    }

    #[test]
    fn shadowed_binder_is_left_alone() {
        // (\x. x)[x := z] is a no-op: the binder shadows the substitution.
        let term = abs("x", var("x"));
        let result = subst_untyped(&term, "x", &var("z"));
        assert!(Arc::ptr_eq(&term, &result));
    }

    #[test]
    fn batch_matches_sequential_application_when_hygienic() {
        // f applied to both targets, substituting a->p and b->q.
        let term = app(var("a"), var("b"));
        let mut batch = BTreeMap::new();
        batch.insert("a".to_string(), var("p"));
        batch.insert("b".to_string(), var("q"));
        let union_fv = union_free_term_vars_untyped(batch.values());
        let batched = subst_untyped_batch(&term, &batch, &union_fv);

        let sequential = subst_untyped(&subst_untyped(&term, "a", &var("p")), "b", &var("q"));
        assert_eq!(batched, sequential);
    }
}
