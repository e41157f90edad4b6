use std::fmt;
use std::sync::Arc;

/// A type in the TripLang surface and core languages.
///
/// `Arc`-boxed children, not plain `Box`: the substitution engine (in
/// `trip-subst`) relies on pointer identity to short-circuit unchanged
/// subtrees, and on cheap cloning when a type is shared between a `Poly`
/// definition's annotation and an inferred constructor signature (see the
/// data expander).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    /// A free or bound type variable.
    TypeVar(String),
    /// A function type `lft -> rgt`.
    Arrow(Arc<BaseType>, Arc<BaseType>),
    /// Higher-kinded application `fn arg`, left-associative in surface form.
    TypeApp(Arc<BaseType>, Arc<BaseType>),
    /// Universal quantification `forall var. body`. Binds `var` lexically
    /// in `body`.
    Forall(String, Arc<BaseType>),
}

impl BaseType {
    pub fn var(name: impl Into<String>) -> Arc<BaseType> {
        Arc::new(BaseType::TypeVar(name.into()))
    }

    pub fn arrow(lft: Arc<BaseType>, rgt: Arc<BaseType>) -> Arc<BaseType> {
        Arc::new(BaseType::Arrow(lft, rgt))
    }

    pub fn app(fun: Arc<BaseType>, arg: Arc<BaseType>) -> Arc<BaseType> {
        Arc::new(BaseType::TypeApp(fun, arg))
    }

    pub fn forall(var: impl Into<String>, body: Arc<BaseType>) -> Arc<BaseType> {
        Arc::new(BaseType::Forall(var.into(), body))
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::TypeVar(name) => write!(f, "{name}"),
            BaseType::Arrow(lft, rgt) => write!(f, "({lft} -> {rgt})"),
            BaseType::TypeApp(fun, arg) => write!(f, "({fun} {arg})"),
            BaseType::Forall(var, body) => write!(f, "(forall {var}. {body})"),
        }
    }
}
