//! A small leftmost-outermost SKI reducer, kept only to make bracket
//! abstraction's output checkable in tests -- the linker itself never
//! reduces anything, it only emits the combinator expression (spec §4.10).

use std::sync::Arc;

use trip_ast::SKITerm;

/// Decompose `term` into `(head, args)` by unwinding the left spine of
/// nested `App` nodes, so `((S x) y) z` becomes `(S, [x, y, z])`.
fn collect_spine(term: &Arc<SKITerm>) -> (Arc<SKITerm>, Vec<Arc<SKITerm>>) {
    let mut args = Vec::new();
    let mut cur = term.clone();
    while let SKITerm::App(f, a) = cur.as_ref() {
        args.push(a.clone());
        cur = f.clone();
    }
    args.reverse();
    (cur, args)
}

fn rebuild_spine(head: Arc<SKITerm>, args: &[Arc<SKITerm>]) -> Arc<SKITerm> {
    args.iter().fold(head, |acc, a| SKITerm::app(acc, a.clone()))
}

/// Perform a single reduction step, if any redex exists. `I x -> x`,
/// `K x y -> x`, `S x y z -> x z (y z)`, applied leftmost-outermost.
fn step(term: &Arc<SKITerm>) -> Option<Arc<SKITerm>> {
    let (head, args) = collect_spine(term);
    match head.as_ref() {
        SKITerm::I if !args.is_empty() => Some(rebuild_spine(args[0].clone(), &args[1..])),
        SKITerm::K if args.len() >= 2 => Some(rebuild_spine(args[0].clone(), &args[2..])),
        SKITerm::S if args.len() >= 3 => {
            let (x, y, z) = (&args[0], &args[1], &args[2]);
            let rewritten = SKITerm::app(SKITerm::app(x.clone(), z.clone()), SKITerm::app(y.clone(), z.clone()));
            Some(rebuild_spine(rewritten, &args[3..]))
        }
        _ => {
            for (i, arg) in args.iter().enumerate() {
                if let Some(reduced) = step(arg) {
                    let mut new_args = args.clone();
                    new_args[i] = reduced;
                    return Some(rebuild_spine(head.clone(), &new_args));
                }
            }
            None
        }
    }
}

/// Reduce `term` until no redex remains or `max_steps` is reached, whichever
/// comes first -- SKI normal forms don't always exist, so callers pick a cap
/// appropriate to what they're testing.
pub fn reduce(term: &Arc<SKITerm>, max_steps: u32) -> Arc<SKITerm> {
    let mut current = term.clone();
    for _ in 0..max_steps {
        match step(&current) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_reduces_its_argument_away() {
        let term = SKITerm::app(Arc::new(SKITerm::I), Arc::new(SKITerm::K));
        assert_eq!(*reduce(&term, 10), SKITerm::K);
    }

    #[test]
    fn k_discards_its_second_argument() {
        let term = SKITerm::app(SKITerm::app(Arc::new(SKITerm::K), Arc::new(SKITerm::I)), Arc::new(SKITerm::K));
        assert_eq!(*reduce(&term, 10), SKITerm::I);
    }

    #[test]
    fn s_k_k_behaves_as_identity() {
        // S K K x -> (K x) (K x) -> x
        let skk = SKITerm::app(SKITerm::app(Arc::new(SKITerm::S), Arc::new(SKITerm::K)), Arc::new(SKITerm::K));
        let applied = SKITerm::app(skk, Arc::new(SKITerm::I));
        assert_eq!(*reduce(&applied, 10), SKITerm::I);
    }
}
