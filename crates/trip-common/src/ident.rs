use std::fmt;

/// A non-empty printable identifier, unique within a single module's
/// definitions. Thin `String` wrapper so the AST and linker never confuse a
/// bare local name with a qualified one at the type level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalName(pub String);

impl LocalName {
    pub fn new(s: impl Into<String>) -> Self {
        LocalName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocalName {
    fn from(s: &str) -> Self {
        LocalName::new(s)
    }
}

impl From<String> for LocalName {
    fn from(s: String) -> Self {
        LocalName(s)
    }
}

/// An identifier naming a module. No dots allowed -- dots are reserved for
/// the qualified-name separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(pub String);

impl ModuleName {
    pub fn new(s: impl Into<String>) -> Self {
        ModuleName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        ModuleName::new(s)
    }
}

/// The pair `(ModuleName, LocalName)`, canonical textual form `module.local`.
///
/// Stored pre-split rather than as one dotted `String`: splitting on the last
/// dot is a hot path during SCC processing (spec's "Module info cache" note),
/// so we simply never pay that cost more than once, at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub module: ModuleName,
    pub local: LocalName,
}

impl QualifiedName {
    pub fn new(module: ModuleName, local: LocalName) -> Self {
        QualifiedName { module, local }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.local)
    }
}
