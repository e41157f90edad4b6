//! Turns `.trip` source text into a token stream, tracking byte offsets for
//! diagnostics. Keywords are recognised by exact text match; everything
//! else alphabetic is an identifier, disambiguated from keywords at the
//! token level so the parser never has to re-check spelling.

use trip_common::{ParseError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Module,
    Import,
    As,
    Export,
    Let,
    Rec,
    Fn,
    Ski,
    Type,
    Data,
    Forall,
    Colon,
    Equals,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Pipe,
    Arrow,
    Lambda,
    BigLambda,
}

pub fn lex(src: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let len = src.len();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    let byte_at = |i: usize| -> usize { chars.get(i).map(|(b, _)| *b).unwrap_or(len) };

    while i < chars.len() {
        let (start, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' {
            while i < chars.len() && chars[i].1 != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '-' && chars.get(i + 1).map(|p| p.1) == Some('>') {
            tokens.push((Token::Arrow, Span::new(start as u32, byte_at(i + 2) as u32)));
            i += 2;
            continue;
        }
        if c == '/' && chars.get(i + 1).map(|p| p.1) == Some('\\') {
            tokens.push((Token::BigLambda, Span::new(start as u32, byte_at(i + 2) as u32)));
            i += 2;
            continue;
        }
        let single_end = byte_at(i + 1) as u32;
        match c {
            '\\' | 'λ' => tokens.push((Token::Lambda, Span::new(start as u32, single_end))),
            'Λ' => tokens.push((Token::BigLambda, Span::new(start as u32, single_end))),
            '∀' => tokens.push((Token::Forall, Span::new(start as u32, single_end))),
            ':' => tokens.push((Token::Colon, Span::new(start as u32, single_end))),
            '=' => tokens.push((Token::Equals, Span::new(start as u32, single_end))),
            '(' => tokens.push((Token::LParen, Span::new(start as u32, single_end))),
            ')' => tokens.push((Token::RParen, Span::new(start as u32, single_end))),
            '[' => tokens.push((Token::LBracket, Span::new(start as u32, single_end))),
            ']' => tokens.push((Token::RBracket, Span::new(start as u32, single_end))),
            '.' => tokens.push((Token::Dot, Span::new(start as u32, single_end))),
            ',' => tokens.push((Token::Comma, Span::new(start as u32, single_end))),
            '|' => tokens.push((Token::Pipe, Span::new(start as u32, single_end))),
            _ if c.is_alphabetic() || c == '_' => {
                let mut j = i;
                while j < chars.len() && (chars[j].1.is_alphanumeric() || chars[j].1 == '_' || chars[j].1 == '\'') {
                    j += 1;
                }
                let ident_end = byte_at(j);
                let text = &src[start..ident_end];
                let tok = match text {
                    "module" => Token::Module,
                    "import" => Token::Import,
                    "as" => Token::As,
                    "export" => Token::Export,
                    "let" => Token::Let,
                    "rec" => Token::Rec,
                    "fn" => Token::Fn,
                    "ski" => Token::Ski,
                    "type" => Token::Type,
                    "data" => Token::Data,
                    "forall" => Token::Forall,
                    _ => Token::Ident(text.to_string()),
                };
                tokens.push((tok, Span::new(start as u32, ident_end as u32)));
                i = j;
                continue;
            }
            other => {
                return Err(ParseError::new(
                    Span::new(start as u32, single_end),
                    format!("unexpected character `{other}`"),
                ))
            }
        }
        i += 1;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_let_binding() {
        let tokens = lex("let id : T -> T = \\x:T. x").unwrap();
        let kinds: Vec<Token> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Let,
                Token::Ident("id".into()),
                Token::Colon,
                Token::Ident("T".into()),
                Token::Arrow,
                Token::Ident("T".into()),
                Token::Equals,
                Token::Lambda,
                Token::Ident("x".into()),
                Token::Colon,
                Token::Ident("T".into()),
                Token::Dot,
                Token::Ident("x".into()),
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let tokens = lex("# a comment\nski i = I").unwrap();
        assert_eq!(tokens.first().unwrap().0, Token::Ski);
    }
}
