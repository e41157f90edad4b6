//! `TripCObject`: the in-memory shape of a `.tripc` file (spec §6), and its
//! canonical text codec.

use std::collections::{BTreeMap, BTreeSet};

use trip_ast::Definition;
use trip_common::{CanonicalValue, LinkError, LocalName, ModuleName, ParseError};

use crate::ast_codec::{decode_definition, encode_definition};
use crate::text::parse_canonical;

/// One `import from.name [as alias]` entry, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportEntry {
    pub from: ModuleName,
    pub name: LocalName,
    pub r#as: Option<LocalName>,
}

/// A loaded or about-to-be-serialised object file: the module's own
/// definitions, which of them are exported, and what it imports.
#[derive(Debug, Clone, PartialEq)]
pub struct TripCObject {
    pub module: ModuleName,
    /// Local name -> definition, for every term/type-kind definition this
    /// module declares. `Module`/`Import`/`Export` markers are split out
    /// into the fields below rather than kept in this map.
    pub definitions: BTreeMap<String, Definition>,
    pub exports: BTreeSet<String>,
    pub imports: Vec<ImportEntry>,
}

impl TripCObject {
    /// Partition a flat definition list -- the parser's direct output --
    /// into the shape an object file stores. Exactly one `Module` marker is
    /// expected; `module` is used if none is present (e.g. when building a
    /// `TripCObject` programmatically).
    ///
    /// A `.tripc` file's `definitions` is a name-keyed mapping (spec §6), so
    /// this assembly step is where the same local name appearing twice in
    /// one module is actually caught -- once the map is built, the
    /// collision is gone.
    pub fn from_definitions(module: ModuleName, defs: Vec<Definition>) -> Result<Self, LinkError> {
        let mut object = TripCObject {
            module,
            definitions: BTreeMap::new(),
            exports: BTreeSet::new(),
            imports: Vec::new(),
        };
        for def in defs {
            match def {
                Definition::Module { name } => object.module = name,
                Definition::Import { from, name, r#as } => object.imports.push(ImportEntry { from, name, r#as }),
                Definition::Export { name } => {
                    object.exports.insert(name.as_str().to_string());
                }
                other => {
                    if let Some(name) = other.name() {
                        if object.definitions.contains_key(name.as_str()) {
                            return Err(LinkError::DuplicateDefinition {
                                module: object.module.clone(),
                                name: name.clone(),
                            });
                        }
                        object.definitions.insert(name.as_str().to_string(), other);
                    }
                }
            }
        }
        Ok(object)
    }

    pub fn to_canonical_string(&self) -> String {
        self.to_canonical_value().to_canonical_string()
    }

    fn to_canonical_value(&self) -> CanonicalValue {
        let definitions = self
            .definitions
            .iter()
            .map(|(name, def)| (name.clone(), encode_definition(def)))
            .collect::<BTreeMap<_, _>>();
        CanonicalValue::object([
            ("module", CanonicalValue::str(self.module.as_str())),
            ("definitions", CanonicalValue::Object(definitions)),
            (
                "exports",
                CanonicalValue::Array(self.exports.iter().map(|n| CanonicalValue::str(n)).collect()),
            ),
            (
                "imports",
                CanonicalValue::Array(
                    self.imports
                        .iter()
                        .map(|imp| {
                            CanonicalValue::object([
                                ("from", CanonicalValue::str(imp.from.as_str())),
                                ("name", CanonicalValue::str(imp.name.as_str())),
                                (
                                    "as",
                                    match &imp.r#as {
                                        Some(alias) => CanonicalValue::str(alias.as_str()),
                                        None => CanonicalValue::Null,
                                    },
                                ),
                            ])
                        })
                        .collect(),
                ),
            ),
        ])
    }

    pub fn from_canonical_string(input: &str) -> Result<Self, ParseError> {
        let value = parse_canonical(input)?;
        Self::from_canonical_value(&value)
    }

    fn from_canonical_value(value: &CanonicalValue) -> Result<Self, ParseError> {
        let fields = match value {
            CanonicalValue::Object(fields) => fields,
            _ => return Err(parse_err("expected a top-level object")),
        };
        let module = match fields.get("module") {
            Some(CanonicalValue::Str(s)) => ModuleName::new(s.clone()),
            _ => return Err(parse_err("missing `module` field")),
        };
        let definitions = match fields.get("definitions") {
            Some(CanonicalValue::Object(defs)) => defs
                .iter()
                .map(|(name, v)| Ok((name.clone(), decode_definition(v)?)))
                .collect::<Result<BTreeMap<_, _>, ParseError>>()?,
            _ => return Err(parse_err("missing `definitions` field")),
        };
        let exports = match fields.get("exports") {
            Some(CanonicalValue::Array(items)) => items
                .iter()
                .map(|v| match v {
                    CanonicalValue::Str(s) => Ok(s.clone()),
                    _ => Err(parse_err("export entry must be a string")),
                })
                .collect::<Result<BTreeSet<_>, ParseError>>()?,
            _ => return Err(parse_err("missing `exports` field")),
        };
        let imports = match fields.get("imports") {
            Some(CanonicalValue::Array(items)) => items
                .iter()
                .map(|v| {
                    let obj = match v {
                        CanonicalValue::Object(f) => f,
                        _ => return Err(parse_err("import entry must be an object")),
                    };
                    let from = match obj.get("from") {
                        Some(CanonicalValue::Str(s)) => ModuleName::new(s.clone()),
                        _ => return Err(parse_err("import entry missing `from`")),
                    };
                    let name = match obj.get("name") {
                        Some(CanonicalValue::Str(s)) => LocalName::new(s.clone()),
                        _ => return Err(parse_err("import entry missing `name`")),
                    };
                    let r#as = match obj.get("as") {
                        Some(CanonicalValue::Str(s)) => Some(LocalName::new(s.clone())),
                        _ => None,
                    };
                    Ok(ImportEntry { from, name, r#as })
                })
                .collect::<Result<Vec<_>, ParseError>>()?,
            _ => return Err(parse_err("missing `imports` field")),
        };
        Ok(TripCObject {
            module,
            definitions,
            exports,
            imports,
        })
    }
}

fn parse_err(message: &str) -> ParseError {
    ParseError::new(trip_common::Span::new(0, 0), message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trip_ast::UntypedTerm;

    #[test]
    fn round_trips_a_small_object() {
        let object = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                Definition::Untyped {
                    name: LocalName::new("id"),
                    term: Arc::new(UntypedTerm::Abs("x".into(), Arc::new(UntypedTerm::Var("x".into())))),
                },
                Definition::Export { name: LocalName::new("id") },
                Definition::Import {
                    from: ModuleName::new("B"),
                    name: LocalName::new("helper"),
                    r#as: Some(LocalName::new("h")),
                },
            ],
        )
        .expect("no duplicate names");
        let text = object.to_canonical_string();
        let decoded = TripCObject::from_canonical_string(&text).expect("decodes");
        assert_eq!(decoded, object);
    }

    #[test]
    fn malformed_shape_is_a_parse_error_not_a_panic() {
        let err = TripCObject::from_canonical_string(r#"{"module":"A"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_local_name_is_rejected() {
        let result = TripCObject::from_definitions(
            ModuleName::new("A"),
            vec![
                Definition::Untyped {
                    name: LocalName::new("x"),
                    term: Arc::new(UntypedTerm::Var("x".into())),
                },
                Definition::Untyped {
                    name: LocalName::new("x"),
                    term: Arc::new(UntypedTerm::Var("x".into())),
                },
            ],
        );
        assert!(matches!(result, Err(trip_common::LinkError::DuplicateDefinition { .. })));
    }
}
