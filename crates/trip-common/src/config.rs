/// Tunable iteration caps for the resolver.
///
/// The spec leaves these as re-implementer-chosen heuristics (spec §9, "Open
/// questions"); this struct is how they're exposed as configuration rather
/// than buried as magic numbers, per that note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Max full passes over an SCC before `UnresolvableCycle`.
    pub scc_iteration_cap: u32,
    /// Max passes re-substituting newly introduced term references before
    /// giving up (inlining can introduce fresh external refs).
    pub term_ref_iteration_cap: u32,
    /// Max passes over type references before `TypeResolutionCap`.
    pub type_ref_iteration_cap: u32,
    /// Max number of ladder steps (poly -> typed -> untyped -> combinator)
    /// applied to a single definition before `LoweringCap`.
    pub lowering_step_cap: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            scc_iteration_cap: 100,
            term_ref_iteration_cap: 20,
            type_ref_iteration_cap: 20,
            lowering_step_cap: 3,
        }
    }
}
