//! Canonical-value encoding and decoding for AST nodes.
//!
//! This is deliberately a separate set of tags from `trip_subst::normalize`:
//! the structural-hash encoder throws variable names away (de Bruijn
//! indices only), while this codec must reconstruct the exact AST the
//! front end produced, names and all.

use std::sync::Arc;

use trip_ast::ty::BaseType;
use trip_ast::{Definition, PolyTerm, SKITerm, TypedTerm, UntypedTerm};
use trip_common::{CanonicalValue, LocalName, ModuleName, ParseError, Span};

fn err(message: impl Into<String>) -> ParseError {
    ParseError::new(Span::new(0, 0), message.into())
}

fn field<'a>(value: &'a CanonicalValue, key: &str) -> Result<&'a CanonicalValue, ParseError> {
    match value {
        CanonicalValue::Object(fields) => fields
            .get(key)
            .ok_or_else(|| err(format!("object is missing field `{key}`"))),
        _ => Err(err(format!("expected an object to read field `{key}`"))),
    }
}

fn as_str(value: &CanonicalValue) -> Result<&str, ParseError> {
    match value {
        CanonicalValue::Str(s) => Ok(s.as_str()),
        _ => Err(err("expected a string")),
    }
}

fn as_bool(value: &CanonicalValue) -> Result<bool, ParseError> {
    match value {
        CanonicalValue::Bool(b) => Ok(*b),
        _ => Err(err("expected a boolean")),
    }
}

fn as_array(value: &CanonicalValue) -> Result<&[CanonicalValue], ParseError> {
    match value {
        CanonicalValue::Array(items) => Ok(items.as_slice()),
        _ => Err(err("expected an array")),
    }
}

fn str_field(value: &CanonicalValue, key: &str) -> Result<String, ParseError> {
    Ok(as_str(field(value, key)?)?.to_string())
}

fn tag(value: &CanonicalValue, key: &str) -> Result<String, ParseError> {
    str_field(value, key)
}

// ── BaseType ─────────────────────────────────────────────────────────────

pub fn encode_type(ty: &BaseType) -> CanonicalValue {
    match ty {
        BaseType::TypeVar(name) => CanonicalValue::object([("k", CanonicalValue::str("TypeVar")), ("name", CanonicalValue::str(name))]),
        BaseType::Arrow(l, r) => CanonicalValue::object([
            ("k", CanonicalValue::str("Arrow")),
            ("l", encode_type(l)),
            ("r", encode_type(r)),
        ]),
        BaseType::TypeApp(f, a) => CanonicalValue::object([
            ("k", CanonicalValue::str("TypeApp")),
            ("fn", encode_type(f)),
            ("arg", encode_type(a)),
        ]),
        BaseType::Forall(v, body) => CanonicalValue::object([
            ("k", CanonicalValue::str("Forall")),
            ("var", CanonicalValue::str(v)),
            ("body", encode_type(body)),
        ]),
    }
}

pub fn decode_type(value: &CanonicalValue) -> Result<Arc<BaseType>, ParseError> {
    match tag(value, "k")?.as_str() {
        "TypeVar" => Ok(BaseType::var(str_field(value, "name")?)),
        "Arrow" => Ok(BaseType::arrow(decode_type(field(value, "l")?)?, decode_type(field(value, "r")?)?)),
        "TypeApp" => Ok(BaseType::app(decode_type(field(value, "fn")?)?, decode_type(field(value, "arg")?)?)),
        "Forall" => Ok(BaseType::forall(str_field(value, "var")?, decode_type(field(value, "body")?)?)),
        other => Err(err(format!("unknown type node kind `{other}`"))),
    }
}

fn encode_optional_type(ty: &Option<Arc<BaseType>>) -> CanonicalValue {
    match ty {
        Some(t) => encode_type(t),
        None => CanonicalValue::Null,
    }
}

fn decode_optional_type(value: &CanonicalValue) -> Result<Option<Arc<BaseType>>, ParseError> {
    match value {
        CanonicalValue::Null => Ok(None),
        other => Ok(Some(decode_type(other)?)),
    }
}

// ── PolyTerm ─────────────────────────────────────────────────────────────

pub fn encode_poly(term: &PolyTerm) -> CanonicalValue {
    match term {
        PolyTerm::Var(name) => CanonicalValue::object([("k", CanonicalValue::str("Var")), ("name", CanonicalValue::str(name))]),
        PolyTerm::Abs(name, ann, body) => CanonicalValue::object([
            ("k", CanonicalValue::str("Abs")),
            ("name", CanonicalValue::str(name)),
            ("ann", encode_type(ann)),
            ("body", encode_poly(body)),
        ]),
        PolyTerm::TAbs(v, body) => CanonicalValue::object([
            ("k", CanonicalValue::str("TAbs")),
            ("var", CanonicalValue::str(v)),
            ("body", encode_poly(body)),
        ]),
        PolyTerm::TypeApp(t, arg) => CanonicalValue::object([
            ("k", CanonicalValue::str("TypeApp")),
            ("term", encode_poly(t)),
            ("arg", encode_type(arg)),
        ]),
        PolyTerm::App(l, r) => CanonicalValue::object([
            ("k", CanonicalValue::str("App")),
            ("l", encode_poly(l)),
            ("r", encode_poly(r)),
        ]),
    }
}

pub fn decode_poly(value: &CanonicalValue) -> Result<Arc<PolyTerm>, ParseError> {
    match tag(value, "k")?.as_str() {
        "Var" => Ok(Arc::new(PolyTerm::Var(str_field(value, "name")?))),
        "Abs" => Ok(Arc::new(PolyTerm::Abs(
            str_field(value, "name")?,
            decode_type(field(value, "ann")?)?,
            decode_poly(field(value, "body")?)?,
        ))),
        "TAbs" => Ok(Arc::new(PolyTerm::TAbs(str_field(value, "var")?, decode_poly(field(value, "body")?)?))),
        "TypeApp" => Ok(Arc::new(PolyTerm::TypeApp(
            decode_poly(field(value, "term")?)?,
            decode_type(field(value, "arg")?)?,
        ))),
        "App" => Ok(Arc::new(PolyTerm::App(decode_poly(field(value, "l")?)?, decode_poly(field(value, "r")?)?))),
        other => Err(err(format!("unknown poly term node kind `{other}`"))),
    }
}

// ── TypedTerm ────────────────────────────────────────────────────────────

pub fn encode_typed(term: &TypedTerm) -> CanonicalValue {
    match term {
        TypedTerm::Var(name) => CanonicalValue::object([("k", CanonicalValue::str("Var")), ("name", CanonicalValue::str(name))]),
        TypedTerm::Abs(name, ann, body) => CanonicalValue::object([
            ("k", CanonicalValue::str("Abs")),
            ("name", CanonicalValue::str(name)),
            ("ann", encode_type(ann)),
            ("body", encode_typed(body)),
        ]),
        TypedTerm::App(l, r) => CanonicalValue::object([
            ("k", CanonicalValue::str("App")),
            ("l", encode_typed(l)),
            ("r", encode_typed(r)),
        ]),
    }
}

pub fn decode_typed(value: &CanonicalValue) -> Result<Arc<TypedTerm>, ParseError> {
    match tag(value, "k")?.as_str() {
        "Var" => Ok(Arc::new(TypedTerm::Var(str_field(value, "name")?))),
        "Abs" => Ok(Arc::new(TypedTerm::Abs(
            str_field(value, "name")?,
            decode_type(field(value, "ann")?)?,
            decode_typed(field(value, "body")?)?,
        ))),
        "App" => Ok(Arc::new(TypedTerm::App(decode_typed(field(value, "l")?)?, decode_typed(field(value, "r")?)?))),
        other => Err(err(format!("unknown typed term node kind `{other}`"))),
    }
}

// ── UntypedTerm ──────────────────────────────────────────────────────────

pub fn encode_untyped(term: &UntypedTerm) -> CanonicalValue {
    match term {
        UntypedTerm::Var(name) => CanonicalValue::object([("k", CanonicalValue::str("Var")), ("name", CanonicalValue::str(name))]),
        UntypedTerm::Abs(name, body) => CanonicalValue::object([
            ("k", CanonicalValue::str("Abs")),
            ("name", CanonicalValue::str(name)),
            ("body", encode_untyped(body)),
        ]),
        UntypedTerm::App(l, r) => CanonicalValue::object([
            ("k", CanonicalValue::str("App")),
            ("l", encode_untyped(l)),
            ("r", encode_untyped(r)),
        ]),
    }
}

pub fn decode_untyped(value: &CanonicalValue) -> Result<Arc<UntypedTerm>, ParseError> {
    match tag(value, "k")?.as_str() {
        "Var" => Ok(Arc::new(UntypedTerm::Var(str_field(value, "name")?))),
        "Abs" => Ok(Arc::new(UntypedTerm::Abs(
            str_field(value, "name")?,
            decode_untyped(field(value, "body")?)?,
        ))),
        "App" => Ok(Arc::new(UntypedTerm::App(
            decode_untyped(field(value, "l")?)?,
            decode_untyped(field(value, "r")?)?,
        ))),
        other => Err(err(format!("unknown untyped term node kind `{other}`"))),
    }
}

// ── SKITerm ──────────────────────────────────────────────────────────────

pub fn encode_ski(term: &SKITerm) -> CanonicalValue {
    match term {
        SKITerm::S => CanonicalValue::object([("k", CanonicalValue::str("S"))]),
        SKITerm::K => CanonicalValue::object([("k", CanonicalValue::str("K"))]),
        SKITerm::I => CanonicalValue::object([("k", CanonicalValue::str("I"))]),
        SKITerm::App(l, r) => CanonicalValue::object([
            ("k", CanonicalValue::str("App")),
            ("l", encode_ski(l)),
            ("r", encode_ski(r)),
        ]),
    }
}

pub fn decode_ski(value: &CanonicalValue) -> Result<Arc<SKITerm>, ParseError> {
    match tag(value, "k")?.as_str() {
        "S" => Ok(Arc::new(SKITerm::S)),
        "K" => Ok(Arc::new(SKITerm::K)),
        "I" => Ok(Arc::new(SKITerm::I)),
        "App" => Ok(Arc::new(SKITerm::App(decode_ski(field(value, "l")?)?, decode_ski(field(value, "r")?)?))),
        other => Err(err(format!("unknown SKI node kind `{other}`"))),
    }
}

// ── Definition ───────────────────────────────────────────────────────────

pub fn encode_definition(def: &Definition) -> CanonicalValue {
    match def {
        Definition::Poly { name, ty, term, rec } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Poly")),
            ("name", CanonicalValue::str(name.as_str())),
            ("ty", encode_optional_type(ty)),
            ("term", encode_poly(term)),
            ("rec", CanonicalValue::Bool(*rec)),
        ]),
        Definition::Typed { name, ty, term } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Typed")),
            ("name", CanonicalValue::str(name.as_str())),
            ("ty", encode_optional_type(ty)),
            ("term", encode_typed(term)),
        ]),
        Definition::Untyped { name, term } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Untyped")),
            ("name", CanonicalValue::str(name.as_str())),
            ("term", encode_untyped(term)),
        ]),
        Definition::Combinator { name, term } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Combinator")),
            ("name", CanonicalValue::str(name.as_str())),
            ("term", encode_ski(term)),
        ]),
        Definition::Type { name, ty } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Type")),
            ("name", CanonicalValue::str(name.as_str())),
            ("ty", encode_type(ty)),
        ]),
        Definition::Data {
            name,
            type_params,
            constructors,
        } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Data")),
            ("name", CanonicalValue::str(name.as_str())),
            (
                "typeParams",
                CanonicalValue::Array(type_params.iter().map(|p| CanonicalValue::str(p)).collect()),
            ),
            (
                "constructors",
                CanonicalValue::Array(
                    constructors
                        .iter()
                        .map(|(ctor, fields)| {
                            CanonicalValue::object([
                                ("name", CanonicalValue::str(ctor.as_str())),
                                ("fields", CanonicalValue::Array(fields.iter().map(|f| encode_type(f)).collect())),
                            ])
                        })
                        .collect(),
                ),
            ),
        ]),
        Definition::Module { name } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Module")),
            ("name", CanonicalValue::str(name.as_str())),
        ]),
        Definition::Import { from, name, r#as } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Import")),
            ("from", CanonicalValue::str(from.as_str())),
            ("name", CanonicalValue::str(name.as_str())),
            (
                "as",
                match r#as {
                    Some(alias) => CanonicalValue::str(alias.as_str()),
                    None => CanonicalValue::Null,
                },
            ),
        ]),
        Definition::Export { name } => CanonicalValue::object([
            ("kind", CanonicalValue::str("Export")),
            ("name", CanonicalValue::str(name.as_str())),
        ]),
    }
}

pub fn decode_definition(value: &CanonicalValue) -> Result<Definition, ParseError> {
    match tag(value, "kind")?.as_str() {
        "Poly" => Ok(Definition::Poly {
            name: LocalName::new(str_field(value, "name")?),
            ty: decode_optional_type(field(value, "ty")?)?,
            term: decode_poly(field(value, "term")?)?,
            rec: as_bool(field(value, "rec")?)?,
        }),
        "Typed" => Ok(Definition::Typed {
            name: LocalName::new(str_field(value, "name")?),
            ty: decode_optional_type(field(value, "ty")?)?,
            term: decode_typed(field(value, "term")?)?,
        }),
        "Untyped" => Ok(Definition::Untyped {
            name: LocalName::new(str_field(value, "name")?),
            term: decode_untyped(field(value, "term")?)?,
        }),
        "Combinator" => Ok(Definition::Combinator {
            name: LocalName::new(str_field(value, "name")?),
            term: decode_ski(field(value, "term")?)?,
        }),
        "Type" => Ok(Definition::Type {
            name: LocalName::new(str_field(value, "name")?),
            ty: decode_type(field(value, "ty")?)?,
        }),
        "Data" => {
            let type_params = as_array(field(value, "typeParams")?)?
                .iter()
                .map(as_str)
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(str::to_string)
                .collect();
            let constructors = as_array(field(value, "constructors")?)?
                .iter()
                .map(|c| {
                    let ctor_name = LocalName::new(str_field(c, "name")?);
                    let fields = as_array(field(c, "fields")?)?
                        .iter()
                        .map(decode_type)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok((ctor_name, fields))
                })
                .collect::<Result<Vec<_>, ParseError>>()?;
            Ok(Definition::Data {
                name: LocalName::new(str_field(value, "name")?),
                type_params,
                constructors,
            })
        }
        "Module" => Ok(Definition::Module {
            name: ModuleName::new(str_field(value, "name")?),
        }),
        "Import" => Ok(Definition::Import {
            from: ModuleName::new(str_field(value, "from")?),
            name: LocalName::new(str_field(value, "name")?),
            r#as: match field(value, "as")? {
                CanonicalValue::Null => None,
                other => Some(LocalName::new(as_str(other)?.to_string())),
            },
        }),
        "Export" => Ok(Definition::Export {
            name: LocalName::new(str_field(value, "name")?),
        }),
        other => Err(err(format!("unknown definition kind `{other}`"))),
    }
}
