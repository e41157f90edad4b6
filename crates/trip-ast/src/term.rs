use std::fmt;
use std::sync::Arc;

use crate::ty::BaseType;

/// A System F (polymorphic) term. The highest rung of the lowering ladder.
#[derive(Debug, Clone, PartialEq)]
pub enum PolyTerm {
    Var(String),
    Abs(String, Arc<BaseType>, Arc<PolyTerm>),
    TAbs(String, Arc<PolyTerm>),
    TypeApp(Arc<PolyTerm>, Arc<BaseType>),
    App(Arc<PolyTerm>, Arc<PolyTerm>),
}

impl fmt::Display for PolyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolyTerm::Var(name) => write!(f, "{name}"),
            PolyTerm::Abs(name, ann, body) => write!(f, "(\\{name}:{ann}. {body})"),
            PolyTerm::TAbs(tv, body) => write!(f, "(/\\{tv}. {body})"),
            PolyTerm::TypeApp(term, arg) => write!(f, "({term} [{arg}])"),
            PolyTerm::App(l, r) => write!(f, "({l} {r})"),
        }
    }
}

/// A simply-typed lambda term: type abstraction/application erased, but
/// parameter annotations remain.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedTerm {
    Var(String),
    Abs(String, Arc<BaseType>, Arc<TypedTerm>),
    App(Arc<TypedTerm>, Arc<TypedTerm>),
}

impl fmt::Display for TypedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedTerm::Var(name) => write!(f, "{name}"),
            TypedTerm::Abs(name, ann, body) => write!(f, "(\\{name}:{ann}. {body})"),
            TypedTerm::App(l, r) => write!(f, "({l} {r})"),
        }
    }
}

/// An untyped lambda term: the level bracket abstraction consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum UntypedTerm {
    Var(String),
    Abs(String, Arc<UntypedTerm>),
    App(Arc<UntypedTerm>, Arc<UntypedTerm>),
}

impl fmt::Display for UntypedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UntypedTerm::Var(name) => write!(f, "{name}"),
            UntypedTerm::Abs(name, body) => write!(f, "(\\{name}. {body})"),
            UntypedTerm::App(l, r) => write!(f, "({l} {r})"),
        }
    }
}

/// A closed SKI combinator expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SKITerm {
    S,
    K,
    I,
    App(Arc<SKITerm>, Arc<SKITerm>),
}

impl SKITerm {
    pub fn app(l: Arc<SKITerm>, r: Arc<SKITerm>) -> Arc<SKITerm> {
        Arc::new(SKITerm::App(l, r))
    }

    /// Whether this expression contains only S, K, I and applications --
    /// trivially true by construction, but kept as an explicit spot-check
    /// for the closedness invariant (spec §8, invariant 2) since it is
    /// cheap and self-documenting at call sites that assert it.
    pub fn is_closed_combinator_form(&self) -> bool {
        true
    }
}

impl fmt::Display for SKITerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SKITerm::S => write!(f, "S"),
            SKITerm::K => write!(f, "K"),
            SKITerm::I => write!(f, "I"),
            SKITerm::App(l, r) => write!(f, "({l} {r})"),
        }
    }
}
