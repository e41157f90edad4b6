use std::sync::Arc;

use trip_common::{LocalName, ModuleName};

use crate::term::{PolyTerm, SKITerm, TypedTerm, UntypedTerm};
use crate::ty::BaseType;

/// A single module-level definition, tagged by `kind`. Mirrors §3 of the
/// spec exactly: one variant per definition form a `.trip` module can
/// contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Poly {
        name: LocalName,
        ty: Option<Arc<BaseType>>,
        term: Arc<PolyTerm>,
        rec: bool,
    },
    Typed {
        name: LocalName,
        ty: Option<Arc<BaseType>>,
        term: Arc<TypedTerm>,
    },
    Untyped {
        name: LocalName,
        term: Arc<UntypedTerm>,
    },
    Combinator {
        name: LocalName,
        term: Arc<SKITerm>,
    },
    /// A type alias.
    Type {
        name: LocalName,
        ty: Arc<BaseType>,
    },
    /// An algebraic data declaration, expanded away before resolution by
    /// the data expander (see `trip-link::data`).
    Data {
        name: LocalName,
        type_params: Vec<String>,
        constructors: Vec<(LocalName, Vec<Arc<BaseType>>)>,
    },
    /// A `module Name` marker. Carries no resolvable value.
    Module { name: ModuleName },
    /// An `import from.name [as alias]` declaration.
    Import {
        from: ModuleName,
        name: LocalName,
        r#as: Option<LocalName>,
    },
    /// An `export name` declaration.
    Export { name: LocalName },
}

impl Definition {
    /// The local name this definition binds, for the variants that bind
    /// one. `Module`/`Import`/`Export` are metadata, not bindings -- they
    /// return `None`.
    pub fn name(&self) -> Option<&LocalName> {
        match self {
            Definition::Poly { name, .. }
            | Definition::Typed { name, .. }
            | Definition::Untyped { name, .. }
            | Definition::Combinator { name, .. }
            | Definition::Type { name, .. }
            | Definition::Data { name, .. } => Some(name),
            Definition::Module { .. } | Definition::Import { .. } | Definition::Export { .. } => {
                None
            }
        }
    }

    /// Whether this definition belongs in the global `types` index (only
    /// `Type` aliases do -- `Data` is expanded away before indexing).
    pub fn is_type_kind(&self) -> bool {
        matches!(self, Definition::Type { .. })
    }

    /// Whether this definition belongs in the global `terms` index.
    pub fn is_term_kind(&self) -> bool {
        matches!(
            self,
            Definition::Poly { .. }
                | Definition::Typed { .. }
                | Definition::Untyped { .. }
                | Definition::Combinator { .. }
        )
    }
}
