//! De Bruijn normalisation (spec §4.1): a canonical, binder-name-independent
//! form used for alpha-equivalence comparisons and as the resolver's
//! "structural hash".
//!
//! Term-variable and type-variable binder stacks are tracked independently
//! (a term abstraction never shifts indices inside a type annotation, and
//! vice versa), matching the spec's design rule.

use trip_ast::ty::BaseType;
use trip_ast::{Definition, PolyTerm, SKITerm, TypedTerm, UntypedTerm};
use trip_common::CanonicalValue;

/// The canonical, name-erased form of a term or type. One node per spec
/// variant; `BoundVar`/`TypeBoundVar` carry a de Bruijn index, `FreeVar`/
/// `FreeTypeVar` carry the name of a reference no enclosing binder in this
/// term captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalForm {
    BoundVar(u32),
    TypeBoundVar(u32),
    FreeVar(String),
    FreeTypeVar(String),
    App(Box<NormalForm>, Box<NormalForm>),
    /// Untyped-level abstraction: body only, the binder name is erased.
    Abs(Box<NormalForm>),
    /// Simply-typed abstraction: annotation then body.
    TypedAbs(Box<NormalForm>, Box<NormalForm>),
    /// System F term abstraction: annotation then body (kept distinct from
    /// `TypedAbs` so a `Poly` and a `Typed` definition that happen to look
    /// alike after erasure never collide in the structural hash before
    /// erasure has actually run).
    SysFAbs(Box<NormalForm>, Box<NormalForm>),
    /// System F type abstraction (`TAbs`): body only, binds a type variable.
    TAbs(Box<NormalForm>),
    /// `BaseType::TypeApp`: type-level application `fn arg`.
    TypeApp(Box<NormalForm>, Box<NormalForm>),
    /// System F term-level type application (`PolyTerm::TypeApp`).
    TyApp(Box<NormalForm>, Box<NormalForm>),
    /// `BaseType::Forall`: body only, binds a type variable.
    Forall(Box<NormalForm>),
    /// One of the SKI terminals.
    Terminal(char),
    /// See `CanonicalValue::BigInt`: no current AST node reaches this arm,
    /// kept so the spec's BigInt-suffix rule has an implementation, not
    /// just a comment.
    BigInt(String),
}

impl NormalForm {
    pub fn to_canonical(&self) -> CanonicalValue {
        match self {
            NormalForm::BoundVar(i) => {
                CanonicalValue::object([("k", CanonicalValue::str("BoundVar")), ("idx", CanonicalValue::Int(*i as i64))])
            }
            NormalForm::TypeBoundVar(i) => CanonicalValue::object([
                ("k", CanonicalValue::str("TypeBoundVar")),
                ("idx", CanonicalValue::Int(*i as i64)),
            ]),
            NormalForm::FreeVar(name) => {
                CanonicalValue::object([("k", CanonicalValue::str("FreeVar")), ("name", CanonicalValue::str(name.clone()))])
            }
            NormalForm::FreeTypeVar(name) => CanonicalValue::object([
                ("k", CanonicalValue::str("FreeTypeVar")),
                ("name", CanonicalValue::str(name.clone())),
            ]),
            NormalForm::App(l, r) => CanonicalValue::object([
                ("k", CanonicalValue::str("App")),
                ("l", l.to_canonical()),
                ("r", r.to_canonical()),
            ]),
            NormalForm::Abs(body) => {
                CanonicalValue::object([("k", CanonicalValue::str("Abs")), ("body", body.to_canonical())])
            }
            NormalForm::TypedAbs(ann, body) => CanonicalValue::object([
                ("k", CanonicalValue::str("TypedAbs")),
                ("ann", ann.to_canonical()),
                ("body", body.to_canonical()),
            ]),
            NormalForm::SysFAbs(ann, body) => CanonicalValue::object([
                ("k", CanonicalValue::str("SysFAbs")),
                ("ann", ann.to_canonical()),
                ("body", body.to_canonical()),
            ]),
            NormalForm::TAbs(body) => {
                CanonicalValue::object([("k", CanonicalValue::str("TAbs")), ("body", body.to_canonical())])
            }
            NormalForm::TypeApp(fun, arg) => CanonicalValue::object([
                ("k", CanonicalValue::str("TypeApp")),
                ("fn", fun.to_canonical()),
                ("arg", arg.to_canonical()),
            ]),
            NormalForm::TyApp(term, arg) => CanonicalValue::object([
                ("k", CanonicalValue::str("TyApp")),
                ("term", term.to_canonical()),
                ("arg", arg.to_canonical()),
            ]),
            NormalForm::Forall(body) => {
                CanonicalValue::object([("k", CanonicalValue::str("Forall")), ("body", body.to_canonical())])
            }
            NormalForm::Terminal(sym) => {
                CanonicalValue::object([("k", CanonicalValue::str("Terminal")), ("sym", CanonicalValue::str(sym.to_string()))])
            }
            NormalForm::BigInt(digits) => {
                CanonicalValue::object([("k", CanonicalValue::str("BigInt")), ("value", CanonicalValue::BigInt(digits.clone()))])
            }
        }
    }
}

/// Binder-name scopes, innermost binder last. Term and type scopes are
/// disjoint stacks, consulted independently.
#[derive(Default)]
struct Scopes<'a> {
    term: Vec<&'a str>,
    ty: Vec<&'a str>,
}

fn lookup(scope: &[&str], name: &str) -> Option<u32> {
    scope
        .iter()
        .rev()
        .position(|n| *n == name)
        .map(|pos| pos as u32)
}

pub fn normalize_type(ty: &BaseType) -> NormalForm {
    let mut scopes = Scopes::default();
    normalize_type_inner(ty, &mut scopes)
}

fn normalize_type_inner(ty: &BaseType, scopes: &mut Scopes<'_>) -> NormalForm {
    match ty {
        BaseType::TypeVar(name) => match lookup(&scopes.ty, name) {
            Some(idx) => NormalForm::TypeBoundVar(idx),
            None => NormalForm::FreeTypeVar(name.clone()),
        },
        BaseType::Arrow(l, r) => NormalForm::App(
            Box::new(normalize_type_inner(l, scopes)),
            Box::new(normalize_type_inner(r, scopes)),
        ),
        BaseType::TypeApp(fun, arg) => NormalForm::TypeApp(
            Box::new(normalize_type_inner(fun, scopes)),
            Box::new(normalize_type_inner(arg, scopes)),
        ),
        BaseType::Forall(var, body) => {
            scopes.ty.push(var);
            let nf = NormalForm::Forall(Box::new(normalize_type_inner(body, scopes)));
            scopes.ty.pop();
            nf
        }
    }
}

pub fn normalize_poly(term: &PolyTerm) -> NormalForm {
    let mut scopes = Scopes::default();
    normalize_poly_inner(term, &mut scopes)
}

fn normalize_poly_inner(term: &PolyTerm, scopes: &mut Scopes<'_>) -> NormalForm {
    match term {
        PolyTerm::Var(name) => match lookup(&scopes.term, name) {
            Some(idx) => NormalForm::BoundVar(idx),
            None => NormalForm::FreeVar(name.clone()),
        },
        PolyTerm::Abs(name, ann, body) => {
            let ann_nf = normalize_type_inner(ann, scopes);
            scopes.term.push(name);
            let body_nf = normalize_poly_inner(body, scopes);
            scopes.term.pop();
            NormalForm::SysFAbs(Box::new(ann_nf), Box::new(body_nf))
        }
        PolyTerm::TAbs(tv, body) => {
            scopes.ty.push(tv);
            let nf = NormalForm::TAbs(Box::new(normalize_poly_inner(body, scopes)));
            scopes.ty.pop();
            nf
        }
        PolyTerm::TypeApp(term, arg) => NormalForm::TyApp(
            Box::new(normalize_poly_inner(term, scopes)),
            Box::new(normalize_type_inner(arg, scopes)),
        ),
        PolyTerm::App(l, r) => NormalForm::App(
            Box::new(normalize_poly_inner(l, scopes)),
            Box::new(normalize_poly_inner(r, scopes)),
        ),
    }
}

pub fn normalize_typed(term: &TypedTerm) -> NormalForm {
    let mut scopes = Scopes::default();
    normalize_typed_inner(term, &mut scopes)
}

fn normalize_typed_inner(term: &TypedTerm, scopes: &mut Scopes<'_>) -> NormalForm {
    match term {
        TypedTerm::Var(name) => match lookup(&scopes.term, name) {
            Some(idx) => NormalForm::BoundVar(idx),
            None => NormalForm::FreeVar(name.clone()),
        },
        TypedTerm::Abs(name, ann, body) => {
            let ann_nf = normalize_type_inner(ann, scopes);
            scopes.term.push(name);
            let body_nf = normalize_typed_inner(body, scopes);
            scopes.term.pop();
            NormalForm::TypedAbs(Box::new(ann_nf), Box::new(body_nf))
        }
        TypedTerm::App(l, r) => NormalForm::App(
            Box::new(normalize_typed_inner(l, scopes)),
            Box::new(normalize_typed_inner(r, scopes)),
        ),
    }
}

pub fn normalize_untyped(term: &UntypedTerm) -> NormalForm {
    let mut scopes = Scopes::default();
    normalize_untyped_inner(term, &mut scopes)
}

fn normalize_untyped_inner(term: &UntypedTerm, scopes: &mut Scopes<'_>) -> NormalForm {
    match term {
        UntypedTerm::Var(name) => match lookup(&scopes.term, name) {
            Some(idx) => NormalForm::BoundVar(idx),
            None => NormalForm::FreeVar(name.clone()),
        },
        UntypedTerm::Abs(name, body) => {
            scopes.term.push(name);
            let nf = NormalForm::Abs(Box::new(normalize_untyped_inner(body, scopes)));
            scopes.term.pop();
            nf
        }
        UntypedTerm::App(l, r) => NormalForm::App(
            Box::new(normalize_untyped_inner(l, scopes)),
            Box::new(normalize_untyped_inner(r, scopes)),
        ),
    }
}

pub fn normalize_ski(term: &SKITerm) -> NormalForm {
    match term {
        SKITerm::S => NormalForm::Terminal('S'),
        SKITerm::K => NormalForm::Terminal('K'),
        SKITerm::I => NormalForm::Terminal('I'),
        SKITerm::App(l, r) => NormalForm::App(Box::new(normalize_ski(l)), Box::new(normalize_ski(r))),
    }
}

/// The resolver's structural hash: the canonical string of a definition's
/// value, after de Bruijn normalisation. Two definitions with the same
/// structural hash are alpha-equivalent; the fixpoint loop in `trip-link`
/// compares these strings directly rather than hashing them further, per
/// spec §4.1.
pub fn structural_hash_of_definition(def: &Definition) -> String {
    let nf = match def {
        Definition::Poly { term, .. } => normalize_poly(term),
        Definition::Typed { term, .. } => normalize_typed(term),
        Definition::Untyped { term, .. } => normalize_untyped(term),
        Definition::Combinator { term, .. } => normalize_ski(term),
        Definition::Type { ty, .. } => normalize_type(ty),
        Definition::Data { .. } | Definition::Module { .. } | Definition::Import { .. } | Definition::Export { .. } => {
            // These carry no reducible value to hash; a stable constant
            // keeps the fixpoint loop well-defined if one ever slips
            // through (it shouldn't -- `Data` is expanded away and the
            // other three never reach the resolver as SCC members).
            return "null".to_string();
        }
    };
    nf.to_canonical().to_canonical_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn alpha_equivalent_untyped_terms_normalise_equal() {
        // \x. x
        let id_x = UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Var("x".into())));
        // \y. y
        let id_y = UntypedTerm::Abs("y".into(), Arc::new(UntypedTerm::Var("y".into())));
        assert_eq!(normalize_untyped(&id_x), normalize_untyped(&id_y));
    }

    #[test]
    fn non_alpha_equivalent_terms_normalise_differently() {
        // \x y. x
        let k_like = UntypedTerm::Abs(
            "x".into(),
            Arc::new(UntypedTerm::Abs("y".into(), Arc::new(UntypedTerm::Var("x".into())))),
        );
        // \x y. y
        let snd = UntypedTerm::Abs(
            "x".into(),
            Arc::new(UntypedTerm::Abs("y".into(), Arc::new(UntypedTerm::Var("y".into())))),
        );
        assert_ne!(normalize_untyped(&k_like), normalize_untyped(&snd));
    }

    #[test]
    fn free_variables_are_distinguished_from_bound_ones() {
        let free = UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Var("z".into())));
        match normalize_untyped(&free) {
            NormalForm::Abs(body) => assert_eq!(*body, NormalForm::FreeVar("z".to_string())),
            other => panic!("expected Abs, got {other:?}"),
        }
    }

    #[test]
    fn structural_hash_of_a_church_style_zero_is_stable() {
        // \f. \x. x
        let def = Definition::Untyped {
            name: trip_common::LocalName::new("zero"),
            term: Arc::new(UntypedTerm::Abs(
                "f".into(),
                Arc::new(UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Var("x".into())))),
            )),
        };
        assert_eq!(
            structural_hash_of_definition(&def),
            r#"{"body":{"body":{"idx":0,"k":"BoundVar"},"k":"Abs"},"k":"Abs"}"#
        );
    }

    #[test]
    fn canonical_string_sorts_keys() {
        let app = UntypedTerm::App(
            Arc::new(UntypedTerm::Var("f".into())),
            Arc::new(UntypedTerm::Var("x".into())),
        );
        let s = normalize_untyped(&app).to_canonical().to_canonical_string();
        assert_eq!(s, r#"{"k":"App","l":{"k":"FreeVar","name":"f"},"r":{"k":"FreeVar","name":"x"}}"#);
    }
}
