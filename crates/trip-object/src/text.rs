//! Decoder for the canonical text grammar `CanonicalValue::to_canonical_string`
//! produces. The encoder lives in `trip-common`; this is its inverse, kept in
//! `trip-object` because only the object codec needs to parse the format back
//! (the structural hash is write-only).

use std::collections::BTreeMap;

use trip_common::{CanonicalValue, ParseError, Span};

pub fn parse_canonical(input: &str) -> Result<CanonicalValue, ParseError> {
    let bytes = input.as_bytes();
    let mut pos = 0usize;
    let value = parse_value(bytes, &mut pos)?;
    skip_ws(bytes, &mut pos);
    if pos != bytes.len() {
        return Err(ParseError::new(
            Span::new(pos as u32, bytes.len() as u32),
            "trailing data after canonical value",
        ));
    }
    Ok(value)
}

fn skip_ws(bytes: &[u8], pos: &mut usize) {
    while *pos < bytes.len() && (bytes[*pos] as char).is_whitespace() {
        *pos += 1;
    }
}

fn expect(bytes: &[u8], pos: &mut usize, ch: u8) -> Result<(), ParseError> {
    skip_ws(bytes, pos);
    if *pos < bytes.len() && bytes[*pos] == ch {
        *pos += 1;
        Ok(())
    } else {
        Err(ParseError::new(
            Span::new(*pos as u32, *pos as u32 + 1),
            format!("expected `{}`", ch as char),
        ))
    }
}

fn parse_value(bytes: &[u8], pos: &mut usize) -> Result<CanonicalValue, ParseError> {
    skip_ws(bytes, pos);
    if *pos >= bytes.len() {
        return Err(ParseError::new(
            Span::new(*pos as u32, *pos as u32),
            "unexpected end of input",
        ));
    }
    match bytes[*pos] {
        b'{' => parse_object(bytes, pos),
        b'[' => parse_array(bytes, pos),
        b'"' => parse_string(bytes, pos).map(CanonicalValue::Str),
        b't' => {
            parse_keyword(bytes, pos, "true")?;
            Ok(CanonicalValue::Bool(true))
        }
        b'f' => {
            parse_keyword(bytes, pos, "false")?;
            Ok(CanonicalValue::Bool(false))
        }
        b'n' => {
            parse_keyword(bytes, pos, "null")?;
            Ok(CanonicalValue::Null)
        }
        b'-' | b'0'..=b'9' => parse_number(bytes, pos),
        other => Err(ParseError::new(
            Span::new(*pos as u32, *pos as u32 + 1),
            format!("unexpected byte `{}`", other as char),
        )),
    }
}

fn parse_keyword(bytes: &[u8], pos: &mut usize, kw: &str) -> Result<(), ParseError> {
    let start = *pos;
    let end = start + kw.len();
    if end <= bytes.len() && &bytes[start..end] == kw.as_bytes() {
        *pos = end;
        Ok(())
    } else {
        Err(ParseError::new(
            Span::new(start as u32, start as u32 + 1),
            format!("expected `{kw}`"),
        ))
    }
}

fn parse_number(bytes: &[u8], pos: &mut usize) -> Result<CanonicalValue, ParseError> {
    let start = *pos;
    if bytes[*pos] == b'-' {
        *pos += 1;
    }
    while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
        *pos += 1;
    }
    let digits_end = *pos;
    // A BigInt is marked with a trailing `n`; otherwise it's a plain Int.
    if *pos < bytes.len() && bytes[*pos] == b'n' {
        let digits = std::str::from_utf8(&bytes[start..digits_end]).unwrap().to_string();
        *pos += 1;
        return Ok(CanonicalValue::BigInt(digits));
    }
    let text = std::str::from_utf8(&bytes[start..digits_end]).unwrap();
    text.parse::<i64>()
        .map(CanonicalValue::Int)
        .map_err(|_| ParseError::new(Span::new(start as u32, digits_end as u32), "malformed integer literal"))
}

fn parse_string(bytes: &[u8], pos: &mut usize) -> Result<String, ParseError> {
    expect(bytes, pos, b'"')?;
    let mut out = String::new();
    loop {
        if *pos >= bytes.len() {
            return Err(ParseError::new(
                Span::new(*pos as u32, *pos as u32),
                "unterminated string literal",
            ));
        }
        match bytes[*pos] {
            b'"' => {
                *pos += 1;
                return Ok(out);
            }
            b'\\' => {
                *pos += 1;
                if *pos >= bytes.len() {
                    return Err(ParseError::new(
                        Span::new(*pos as u32, *pos as u32),
                        "unterminated escape sequence",
                    ));
                }
                match bytes[*pos] {
                    b'"' => out.push('"'),
                    b'\\' => out.push('\\'),
                    b'n' => out.push('\n'),
                    other => {
                        return Err(ParseError::new(
                            Span::new(*pos as u32, *pos as u32 + 1),
                            format!("unknown escape `\\{}`", other as char),
                        ))
                    }
                }
                *pos += 1;
            }
            _ => {
                // The canonical encoder only ever emits ASCII control
                // escapes; everything else (including multi-byte UTF-8) is
                // copied through byte-for-byte via the `str` fast path.
                let rest = std::str::from_utf8(&bytes[*pos..]).map_err(|_| {
                    ParseError::new(Span::new(*pos as u32, *pos as u32 + 1), "invalid UTF-8 in string literal")
                })?;
                let ch = rest.chars().next().unwrap();
                out.push(ch);
                *pos += ch.len_utf8();
            }
        }
    }
}

fn parse_array(bytes: &[u8], pos: &mut usize) -> Result<CanonicalValue, ParseError> {
    expect(bytes, pos, b'[')?;
    let mut items = Vec::new();
    skip_ws(bytes, pos);
    if *pos < bytes.len() && bytes[*pos] == b']' {
        *pos += 1;
        return Ok(CanonicalValue::Array(items));
    }
    loop {
        items.push(parse_value(bytes, pos)?);
        skip_ws(bytes, pos);
        if *pos < bytes.len() && bytes[*pos] == b',' {
            *pos += 1;
            continue;
        }
        break;
    }
    expect(bytes, pos, b']')?;
    Ok(CanonicalValue::Array(items))
}

fn parse_object(bytes: &[u8], pos: &mut usize) -> Result<CanonicalValue, ParseError> {
    expect(bytes, pos, b'{')?;
    let mut fields = BTreeMap::new();
    skip_ws(bytes, pos);
    if *pos < bytes.len() && bytes[*pos] == b'}' {
        *pos += 1;
        return Ok(CanonicalValue::Object(fields));
    }
    loop {
        skip_ws(bytes, pos);
        let key = parse_string(bytes, pos)?;
        expect(bytes, pos, b':')?;
        let value = parse_value(bytes, pos)?;
        fields.insert(key, value);
        skip_ws(bytes, pos);
        if *pos < bytes.len() && bytes[*pos] == b',' {
            *pos += 1;
            continue;
        }
        break;
    }
    expect(bytes, pos, b'}')?;
    Ok(CanonicalValue::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_and_decode() {
        let value = CanonicalValue::object([
            ("b", CanonicalValue::Bool(true)),
            ("a", CanonicalValue::Array(vec![CanonicalValue::Int(1), CanonicalValue::Int(2)])),
            ("s", CanonicalValue::str("quote\"back\\slash")),
        ]);
        let text = value.to_canonical_string();
        let parsed = parse_canonical(&text).expect("parses");
        assert_eq!(parsed, value);
    }

    #[test]
    fn bigint_suffix_round_trips() {
        let value = CanonicalValue::BigInt("99999999999999999999".to_string());
        let text = value.to_canonical_string();
        assert_eq!(parse_canonical(&text).unwrap(), value);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse_canonical("null garbage").is_err());
    }
}
