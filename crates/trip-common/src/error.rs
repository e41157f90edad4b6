use std::fmt;

use crate::ident::{LocalName, ModuleName, QualifiedName};

/// A fatal error raised while building the program space or resolving
/// cross-module dependencies. Every variant here corresponds to one row of
/// the error table in the spec; the linker reports the first one it hits
/// and stops -- there is no partial recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Same local name defined twice in a module.
    DuplicateDefinition { module: ModuleName, name: LocalName },
    /// Same symbol exported by two or more modules.
    AmbiguousExport {
        name: LocalName,
        exporters: Vec<ModuleName>,
    },
    /// Import refers to a module that was never loaded.
    UnknownModule {
        importing_module: ModuleName,
        from: ModuleName,
    },
    /// Import refers to a symbol the source module does not export.
    NotExported {
        importing_module: ModuleName,
        from: ModuleName,
        name: LocalName,
    },
    /// Import refers to neither a term nor a type in the source module.
    NoSuchSymbol {
        importing_module: ModuleName,
        from: ModuleName,
        name: LocalName,
    },
    /// Two imports in the same module bind the same local alias.
    DuplicateImport { module: ModuleName, alias: LocalName },
    /// A free reference could not be matched through the import
    /// environment, local definitions, or the export index.
    UnresolvedSymbol {
        module: ModuleName,
        name: LocalName,
        candidates: Vec<ModuleName>,
    },
    /// SCC fixpoint iteration exceeded its cap without the structural hash
    /// stabilising.
    UnresolvableCycle {
        members: Vec<QualifiedName>,
        iterations: u32,
    },
    /// Type-reference resolution exceeded its cap with references still
    /// outstanding.
    TypeResolutionCap {
        def: QualifiedName,
        remaining: Vec<LocalName>,
    },
    /// A `data` declaration had no constructors, a duplicate constructor or
    /// type-parameter name, or a constructor named the same as the type.
    DataMalformed {
        module: ModuleName,
        name: LocalName,
        reason: String,
    },
    /// No module exports `main`.
    NoMain,
    /// More than one module exports `main`.
    AmbiguousMain { exporters: Vec<ModuleName> },
    /// The symbol named `main` is a type alias, not a term.
    MainIsType { module: ModuleName },
    /// The lowering ladder did not reach `combinator` within its step cap.
    LoweringCap { def: QualifiedName, steps: u32 },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::DuplicateDefinition { module, name } => {
                write!(f, "duplicate definition `{name}` in module `{module}`")
            }
            LinkError::AmbiguousExport { name, exporters } => {
                write!(
                    f,
                    "symbol `{name}` is exported by multiple modules: {}",
                    join_modules(exporters)
                )
            }
            LinkError::UnknownModule {
                importing_module,
                from,
            } => write!(
                f,
                "module `{importing_module}` imports from unknown module `{from}`"
            ),
            LinkError::NotExported {
                importing_module,
                from,
                name,
            } => write!(
                f,
                "module `{importing_module}` imports `{name}` from `{from}`, but `{from}` does not export it"
            ),
            LinkError::NoSuchSymbol {
                importing_module,
                from,
                name,
            } => write!(
                f,
                "module `{importing_module}` imports `{name}` from `{from}`, but `{from}` defines neither a term nor a type named `{name}`"
            ),
            LinkError::DuplicateImport { module, alias } => write!(
                f,
                "module `{module}` imports two different symbols under the alias `{alias}`"
            ),
            LinkError::UnresolvedSymbol {
                module,
                name,
                candidates,
            } => {
                if candidates.is_empty() {
                    write!(f, "unresolved symbol `{name}` in module `{module}`")
                } else {
                    write!(
                        f,
                        "unresolved symbol `{name}` in module `{module}`; did you forget `import {}.{name}`?",
                        candidates[0]
                    )
                }
            }
            LinkError::UnresolvableCycle { members, iterations } => write!(
                f,
                "cycle {{{}}} did not converge after {iterations} passes",
                members
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LinkError::TypeResolutionCap { def, remaining } => write!(
                f,
                "type references in `{def}` did not resolve within the iteration cap: {}",
                remaining
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            LinkError::DataMalformed { module, name, reason } => write!(
                f,
                "malformed data declaration `{name}` in module `{module}`: {reason}"
            ),
            LinkError::NoMain => write!(f, "no module exports `main`"),
            LinkError::AmbiguousMain { exporters } => write!(
                f,
                "`main` is exported by multiple modules: {}",
                join_modules(exporters)
            ),
            LinkError::MainIsType { module } => {
                write!(f, "`main` in module `{module}` is a type alias, not a term")
            }
            LinkError::LoweringCap { def, steps } => write!(
                f,
                "lowering `{def}` did not reach a combinator form within {steps} steps"
            ),
        }
    }
}

impl std::error::Error for LinkError {}

fn join_modules(modules: &[ModuleName]) -> String {
    modules
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_symbol_suggests_import() {
        let err = LinkError::UnresolvedSymbol {
            module: ModuleName::new("A"),
            name: LocalName::new("foo"),
            candidates: vec![ModuleName::new("B")],
        };
        assert_eq!(
            err.to_string(),
            "unresolved symbol `foo` in module `A`; did you forget `import B.foo`?"
        );
    }

    #[test]
    fn ambiguous_export_names_both_modules() {
        let err = LinkError::AmbiguousExport {
            name: LocalName::new("helper"),
            exporters: vec![ModuleName::new("A"), ModuleName::new("B")],
        };
        assert_eq!(
            err.to_string(),
            "symbol `helper` is exported by multiple modules: A, B"
        );
    }
}
