//! Bracket abstraction: rewrite a named-variable `UntypedTerm` into a closed
//! `SKITerm`, using the standard S/K/I/B/C elimination rules (spec §4.9).
//!
//! `B` and `C` are aids to keep the output from blowing up on every nested
//! `App`, not part of the final alphabet -- the output only ever contains
//! `S`, `K`, `I`. Rather than hand-derive their SKI encodings (easy to get
//! subtly wrong), `B` and `C` are themselves obtained by running the base
//! S/K/I elimination rules over their own lambda definitions once, lazily,
//! the first time either is needed.

use std::sync::{Arc, OnceLock};

use trip_ast::{SKITerm, UntypedTerm};

use crate::error::BracketError;

/// An intermediate combinator expression that may still carry free term
/// variables -- the shape bracket abstraction works over before every
/// variable has been eliminated.
#[derive(Debug, Clone, PartialEq)]
enum OpenTerm {
    Var(String),
    S,
    K,
    I,
    B,
    C,
    App(Box<OpenTerm>, Box<OpenTerm>),
}

impl OpenTerm {
    fn app(l: OpenTerm, r: OpenTerm) -> OpenTerm {
        OpenTerm::App(Box::new(l), Box::new(r))
    }
}

fn contains_free(x: &str, term: &OpenTerm) -> bool {
    match term {
        OpenTerm::Var(n) => n == x,
        OpenTerm::S | OpenTerm::K | OpenTerm::I | OpenTerm::B | OpenTerm::C => false,
        OpenTerm::App(l, r) => contains_free(x, l) || contains_free(x, r),
    }
}

fn convert(term: &UntypedTerm) -> OpenTerm {
    match term {
        UntypedTerm::Var(name) => OpenTerm::Var(name.clone()),
        UntypedTerm::App(l, r) => OpenTerm::app(convert(l), convert(r)),
        UntypedTerm::Abs(name, body) => eliminate(name, convert(body)),
    }
}

/// Eliminate `x` from `term`, producing an equivalent combinator expression
/// with no occurrence of `x`.
fn eliminate(x: &str, term: OpenTerm) -> OpenTerm {
    if !contains_free(x, &term) {
        return OpenTerm::app(OpenTerm::K, term);
    }
    match term {
        OpenTerm::Var(_) => OpenTerm::I,
        OpenTerm::App(l, r) => {
            let free_l = contains_free(x, &l);
            let free_r = contains_free(x, &r);
            match (free_l, free_r) {
                (true, true) => OpenTerm::app(OpenTerm::app(OpenTerm::S, eliminate(x, *l)), eliminate(x, *r)),
                (true, false) => OpenTerm::app(OpenTerm::app(OpenTerm::C, eliminate(x, *l)), *r),
                (false, true) => OpenTerm::app(OpenTerm::app(OpenTerm::B, *l), eliminate(x, *r)),
                (false, false) => unreachable!("contains_free(x, App(l, r)) was true but neither side contains x"),
            }
        }
        // S/K/I/B/C can't reach here: contains_free is always false for them,
        // so the early return above already handled this term.
        constant => OpenTerm::app(OpenTerm::K, constant),
    }
}

fn plain_abstract(term: &UntypedTerm) -> OpenTerm {
    convert(term)
}

/// The pure-S/K/I encoding of `B = \f g x. f (g x)`, obtained by running the
/// base elimination rules over `B`'s own lambda definition (not hand-derived).
fn b_combinator() -> &'static Arc<SKITerm> {
    static CELL: OnceLock<Arc<SKITerm>> = OnceLock::new();
    CELL.get_or_init(|| {
        let lambda = UntypedTerm::Abs(
            "f".into(),
            Arc::new(UntypedTerm::Abs(
                "g".into(),
                Arc::new(UntypedTerm::Abs(
                    "x".into(),
                    Arc::new(UntypedTerm::App(
                        Arc::new(UntypedTerm::Var("f".into())),
                        Arc::new(UntypedTerm::App(
                            Arc::new(UntypedTerm::Var("g".into())),
                            Arc::new(UntypedTerm::Var("x".into())),
                        )),
                    )),
                )),
            )),
        );
        open_to_ski_base(&plain_abstract(&lambda)).expect("B's own definition is closed by construction")
    })
}

/// The pure-S/K/I encoding of `C = \f x y. f y x`.
fn c_combinator() -> &'static Arc<SKITerm> {
    static CELL: OnceLock<Arc<SKITerm>> = OnceLock::new();
    CELL.get_or_init(|| {
        let lambda = UntypedTerm::Abs(
            "f".into(),
            Arc::new(UntypedTerm::Abs(
                "x".into(),
                Arc::new(UntypedTerm::Abs(
                    "y".into(),
                    Arc::new(UntypedTerm::App(
                        Arc::new(UntypedTerm::App(
                            Arc::new(UntypedTerm::Var("f".into())),
                            Arc::new(UntypedTerm::Var("y".into())),
                        )),
                        Arc::new(UntypedTerm::Var("x".into())),
                    )),
                )),
            )),
        );
        open_to_ski_base(&plain_abstract(&lambda)).expect("C's own definition is closed by construction")
    })
}

/// Convert a fully-eliminated `OpenTerm` to `SKITerm`, treating `B`/`C` as
/// plain opaque symbols rather than expanding them -- used only to bootstrap
/// `b_combinator`/`c_combinator` themselves, whose own elimination never
/// introduces `B`/`C` (the base rules only ever produce S/K/I).
fn open_to_ski_base(term: &OpenTerm) -> Result<Arc<SKITerm>, BracketError> {
    match term {
        OpenTerm::S => Ok(Arc::new(SKITerm::S)),
        OpenTerm::K => Ok(Arc::new(SKITerm::K)),
        OpenTerm::I => Ok(Arc::new(SKITerm::I)),
        OpenTerm::B | OpenTerm::C => unreachable!("base elimination never introduces B or C"),
        OpenTerm::App(l, r) => Ok(SKITerm::app(open_to_ski_base(l)?, open_to_ski_base(r)?)),
        OpenTerm::Var(name) => Err(BracketError::FreeVariable { name: name.clone() }),
    }
}

/// Convert a fully-eliminated `OpenTerm` to `SKITerm`, expanding `B`/`C` to
/// their S/K/I encodings.
fn open_to_ski(term: &OpenTerm) -> Result<Arc<SKITerm>, BracketError> {
    match term {
        OpenTerm::S => Ok(Arc::new(SKITerm::S)),
        OpenTerm::K => Ok(Arc::new(SKITerm::K)),
        OpenTerm::I => Ok(Arc::new(SKITerm::I)),
        OpenTerm::B => Ok(b_combinator().clone()),
        OpenTerm::C => Ok(c_combinator().clone()),
        OpenTerm::App(l, r) => Ok(SKITerm::app(open_to_ski(l)?, open_to_ski(r)?)),
        OpenTerm::Var(name) => Err(BracketError::FreeVariable { name: name.clone() }),
    }
}

/// Abstract a closed `UntypedTerm` into a closed `SKITerm`.
pub fn bracket_abstract(term: &UntypedTerm) -> Result<Arc<SKITerm>, BracketError> {
    open_to_ski(&convert(term))
}

/// The inverse embedding: every SKI terminal is itself expressible as a
/// closed lambda term (`S = \f g x. f x (g x)`, `K = \x y. x`, `I = \x. x`),
/// so a `Combinator` definition referenced from ordinary term position can
/// be rebuilt as an `UntypedTerm` without adding a new AST variant for it.
pub fn ski_to_untyped(term: &SKITerm) -> Arc<UntypedTerm> {
    match term {
        SKITerm::S => {
            static CELL: OnceLock<Arc<UntypedTerm>> = OnceLock::new();
            CELL.get_or_init(|| {
                lambda3("f", "g", "x", |f, g, x| {
                    app(app(f.clone(), x.clone()), app(g, x))
                })
            })
            .clone()
        }
        SKITerm::K => {
            static CELL: OnceLock<Arc<UntypedTerm>> = OnceLock::new();
            CELL.get_or_init(|| lambda2("x", "y", |x, _y| x)).clone()
        }
        SKITerm::I => {
            static CELL: OnceLock<Arc<UntypedTerm>> = OnceLock::new();
            CELL.get_or_init(|| lambda1("x", |x| x)).clone()
        }
        SKITerm::App(l, r) => Arc::new(UntypedTerm::App(ski_to_untyped(l), ski_to_untyped(r))),
    }
}

fn var(name: &str) -> Arc<UntypedTerm> {
    Arc::new(UntypedTerm::Var(name.to_string()))
}

fn app(l: Arc<UntypedTerm>, r: Arc<UntypedTerm>) -> Arc<UntypedTerm> {
    Arc::new(UntypedTerm::App(l, r))
}

fn lambda1(x: &str, body: impl FnOnce(Arc<UntypedTerm>) -> Arc<UntypedTerm>) -> Arc<UntypedTerm> {
    Arc::new(UntypedTerm::Abs(x.to_string(), body(var(x))))
}

fn lambda2(x: &str, y: &str, body: impl FnOnce(Arc<UntypedTerm>, Arc<UntypedTerm>) -> Arc<UntypedTerm>) -> Arc<UntypedTerm> {
    Arc::new(UntypedTerm::Abs(
        x.to_string(),
        Arc::new(UntypedTerm::Abs(y.to_string(), body(var(x), var(y)))),
    ))
}

fn lambda3(
    x: &str,
    y: &str,
    z: &str,
    body: impl FnOnce(Arc<UntypedTerm>, Arc<UntypedTerm>, Arc<UntypedTerm>) -> Arc<UntypedTerm>,
) -> Arc<UntypedTerm> {
    Arc::new(UntypedTerm::Abs(
        x.to_string(),
        Arc::new(UntypedTerm::Abs(
            y.to_string(),
            Arc::new(UntypedTerm::Abs(z.to_string(), body(var(x), var(y), var(z)))),
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::reduce;

    fn var(n: &str) -> Arc<UntypedTerm> {
        Arc::new(UntypedTerm::Var(n.to_string()))
    }

    #[test]
    fn identity_lambda_abstracts_to_i() {
        let term = UntypedTerm::Abs("x".into(), var("x"));
        let ski = bracket_abstract(&term).unwrap();
        assert_eq!(*ski, SKITerm::I);
    }

    #[test]
    fn const_lambda_returns_first_argument_under_reduction() {
        // \x. \y. x, applied to two atoms, should reduce to the first one.
        let term = UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Abs("y".into(), var("x"))));
        let ski = bracket_abstract(&term).unwrap();
        let applied = SKITerm::app(SKITerm::app(ski, Arc::new(SKITerm::K)), Arc::new(SKITerm::I));
        let result = reduce(&applied, 100);
        assert_eq!(*result, SKITerm::K);
    }

    #[test]
    fn flip_lambda_swaps_arguments_under_reduction() {
        // \x. \y. y x, applied to two atoms, should reduce to the second one.
        let term = UntypedTerm::Abs(
            "x".into(),
            Arc::new(UntypedTerm::Abs(
                "y".into(),
                Arc::new(UntypedTerm::App(var("y"), var("x"))),
            )),
        );
        let ski = bracket_abstract(&term).unwrap();
        let applied = SKITerm::app(SKITerm::app(ski, Arc::new(SKITerm::K)), Arc::new(SKITerm::I));
        let result = reduce(&applied, 100);
        assert_eq!(*result, SKITerm::I);
    }

    #[test]
    fn ski_to_untyped_round_trips_through_bracket_abstraction() {
        // Embedding K as a lambda term and re-abstracting it must still
        // behave like K under reduction.
        let embedded = ski_to_untyped(&SKITerm::K);
        let reabstracted = bracket_abstract(&embedded).unwrap();
        let applied = SKITerm::app(SKITerm::app(reabstracted, Arc::new(SKITerm::S)), Arc::new(SKITerm::I));
        let result = reduce(&applied, 200);
        assert_eq!(*result, SKITerm::S);
    }

    #[test]
    fn closed_application_with_no_lambdas_abstracts_directly() {
        let term = UntypedTerm::App(var("f"), var("x"));
        // `f` and `x` are themselves free here, so abstraction alone can't
        // close this -- this exercises the FreeVariable error path.
        assert!(bracket_abstract(&term).is_err());
    }
}
