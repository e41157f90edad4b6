use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A small typed tree shared by the structural-hash encoder (`trip-subst`)
/// and the object-file codec (`trip-object`): both need "serialise with
/// keys in sorted order, BigInt literals suffixed with `n`" and there is no
/// reason to implement that rule twice.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Int(i64),
    /// An arbitrary-precision integer literal, rendered with a trailing `n`
    /// so it can never collide with an `Int` of the same digits when
    /// serialised (spec §4.1 / §6).
    BigInt(String),
    Str(String),
    Array(Vec<CanonicalValue>),
    /// Sorted by key on write; the `BTreeMap` already maintains that order,
    /// so no explicit sort step is needed at serialisation time.
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    pub fn object(fields: impl IntoIterator<Item = (&'static str, CanonicalValue)>) -> Self {
        let mut map = BTreeMap::new();
        for (k, v) in fields {
            map.insert(k.to_string(), v);
        }
        CanonicalValue::Object(map)
    }

    pub fn str(s: impl Into<String>) -> Self {
        CanonicalValue::Str(s.into())
    }

    /// Render to the canonical text form used both as the structural hash
    /// input and as the on-disk object-file encoding.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            CanonicalValue::Null => out.push_str("null"),
            CanonicalValue::Bool(b) => {
                out.push_str(if *b { "true" } else { "false" });
            }
            CanonicalValue::Int(n) => {
                let _ = write!(out, "{n}");
            }
            CanonicalValue::BigInt(digits) => {
                let _ = write!(out, "{digits}n");
            }
            CanonicalValue::Str(s) => {
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        _ => out.push(c),
                    }
                }
                out.push('"');
            }
            CanonicalValue::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            CanonicalValue::Object(fields) => {
                out.push('{');
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "\"{k}\":");
                    v.write_canonical(out);
                }
                out.push('}');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_serialise_in_sorted_order_regardless_of_insertion() {
        let value = CanonicalValue::object([
            ("z", CanonicalValue::Int(1)),
            ("a", CanonicalValue::Int(2)),
        ]);
        assert_eq!(value.to_canonical_string(), r#"{"a":2,"z":1}"#);
    }

    #[test]
    fn bigint_gets_n_suffix() {
        let value = CanonicalValue::BigInt("123456789012345678901234567890".to_string());
        assert_eq!(
            value.to_canonical_string(),
            "123456789012345678901234567890n"
        );
    }
}
