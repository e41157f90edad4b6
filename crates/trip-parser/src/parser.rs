//! Recursive-descent parser: token stream to `Vec<Definition>`. No type
//! inference and no bracket abstraction happen here -- only the tagged-
//! variant AST is built (spec §4.11).
//!
//! Surface-level-to-AST-level dispatch for `let` bindings: the parser
//! decides Poly vs Typed vs Untyped from what's written, not from any
//! later analysis --
//!   - `let rec name : T = e` is always `Poly` (`rec` only exists there).
//!   - `let name : T = e` is `Poly` if `T` mentions `forall`/`Λ` anywhere,
//!     otherwise `Typed`.
//!   - `let name = e` with no annotation at all is `Untyped`.

use std::sync::Arc;

use trip_ast::ty::BaseType;
use trip_ast::{Definition, PolyTerm, SKITerm, TypedTerm, UntypedTerm};
use trip_common::{LocalName, ModuleName, ParseError, Span};

use crate::lexer::{lex, Token};

pub fn parse_source(src: &str) -> Result<Vec<Definition>, ParseError> {
    let tokens = lex(src)?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .unwrap_or_else(|| self.tokens.last().map(|(_, s)| *s).unwrap_or_default())
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: Token) -> bool {
        if self.peek() == Some(&tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) -> Result<(), ParseError> {
        if self.eat(tok.clone()) {
            Ok(())
        } else {
            Err(ParseError::new(
                self.peek_span(),
                format!("expected {tok:?}, found {:?}", self.peek()),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            other => Err(ParseError::new(self.peek_span(), format!("expected an identifier, found {other:?}"))),
        }
    }

    fn at_ident(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_)))
    }

    fn at_type_atom_start(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_)) | Some(Token::LParen) | Some(Token::Forall))
    }

    // ── Program ──────────────────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Vec<Definition>, ParseError> {
        let mut defs = Vec::new();
        if self.eat(Token::Module) {
            let name = self.expect_ident()?;
            defs.push(Definition::Module { name: ModuleName::new(name) });
        }
        while self.peek().is_some() {
            defs.push(self.parse_definition()?);
        }
        Ok(defs)
    }

    fn parse_definition(&mut self) -> Result<Definition, ParseError> {
        match self.peek() {
            Some(Token::Import) => self.parse_import(),
            Some(Token::Export) => self.parse_export(),
            Some(Token::Let) => self.parse_let(),
            Some(Token::Fn) => self.parse_fn(),
            Some(Token::Ski) => self.parse_ski(),
            Some(Token::Type) => self.parse_type_alias(),
            Some(Token::Data) => self.parse_data(),
            other => Err(ParseError::new(self.peek_span(), format!("expected a definition, found {other:?}"))),
        }
    }

    fn parse_import(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Import)?;
        let from = self.expect_ident()?;
        self.expect(Token::Dot)?;
        let name = self.expect_ident()?;
        let alias = if self.eat(Token::As) { Some(self.expect_ident()?) } else { None };
        Ok(Definition::Import {
            from: ModuleName::new(from),
            name: LocalName::new(name),
            r#as: alias.map(LocalName::new),
        })
    }

    fn parse_export(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Export)?;
        let name = self.expect_ident()?;
        Ok(Definition::Export { name: LocalName::new(name) })
    }

    fn parse_let(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Let)?;
        let rec = self.eat(Token::Rec);
        let name = self.expect_ident()?;
        let ty = if self.eat(Token::Colon) { Some(self.parse_type()?) } else { None };
        self.expect(Token::Equals)?;

        let is_poly = rec || ty.as_ref().is_some_and(|t| type_contains_forall(t));
        if is_poly {
            let term = self.parse_poly_term()?;
            Ok(Definition::Poly {
                name: LocalName::new(name),
                ty,
                term,
                rec,
            })
        } else if ty.is_some() {
            let term = self.parse_typed_term()?;
            Ok(Definition::Typed {
                name: LocalName::new(name),
                ty,
                term,
            })
        } else {
            let term = self.parse_untyped_term()?;
            Ok(Definition::Untyped {
                name: LocalName::new(name),
                term,
            })
        }
    }

    fn parse_fn(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Fn)?;
        let name = self.expect_ident()?;
        self.expect(Token::LParen)?;
        let param = self.expect_ident()?;
        self.expect(Token::Colon)?;
        let ann = self.parse_type()?;
        self.expect(Token::RParen)?;
        self.expect(Token::Equals)?;
        let body = self.parse_typed_term()?;
        Ok(Definition::Typed {
            name: LocalName::new(name),
            ty: None,
            term: Arc::new(TypedTerm::Abs(param, ann, body)),
        })
    }

    fn parse_ski(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Ski)?;
        let name = self.expect_ident()?;
        self.expect(Token::Equals)?;
        let term = self.parse_ski_app()?;
        Ok(Definition::Combinator {
            name: LocalName::new(name),
            term,
        })
    }

    fn parse_type_alias(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Type)?;
        let name = self.expect_ident()?;
        self.expect(Token::Equals)?;
        let ty = self.parse_type()?;
        Ok(Definition::Type {
            name: LocalName::new(name),
            ty,
        })
    }

    fn parse_data(&mut self) -> Result<Definition, ParseError> {
        self.expect(Token::Data)?;
        let name = self.expect_ident()?;
        let mut type_params = Vec::new();
        while self.at_ident() {
            type_params.push(self.expect_ident()?);
        }
        self.expect(Token::Equals)?;
        let mut constructors = Vec::new();
        loop {
            let ctor_name = self.expect_ident()?;
            let mut fields = Vec::new();
            while self.at_type_atom_start() {
                fields.push(self.parse_atom_type()?);
            }
            constructors.push((LocalName::new(ctor_name), fields));
            if self.eat(Token::Pipe) {
                continue;
            }
            break;
        }
        Ok(Definition::Data {
            name: LocalName::new(name),
            type_params,
            constructors,
        })
    }

    // ── Types ────────────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Result<Arc<BaseType>, ParseError> {
        let left = self.parse_app_type()?;
        if self.eat(Token::Arrow) {
            let right = self.parse_type()?;
            Ok(BaseType::arrow(left, right))
        } else {
            Ok(left)
        }
    }

    fn parse_app_type(&mut self) -> Result<Arc<BaseType>, ParseError> {
        let mut left = self.parse_atom_type()?;
        while self.at_type_atom_start() {
            let right = self.parse_atom_type()?;
            left = BaseType::app(left, right);
        }
        Ok(left)
    }

    fn parse_atom_type(&mut self) -> Result<Arc<BaseType>, ParseError> {
        if self.eat(Token::Forall) {
            let var = self.expect_ident()?;
            self.expect(Token::Dot)?;
            let body = self.parse_type()?;
            return Ok(BaseType::forall(var, body));
        }
        if self.eat(Token::LParen) {
            let t = self.parse_type()?;
            self.expect(Token::RParen)?;
            return Ok(t);
        }
        let name = self.expect_ident()?;
        Ok(BaseType::var(name))
    }

    // ── Poly terms ───────────────────────────────────────────────────────

    fn at_poly_atom_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Ident(_)) | Some(Token::LParen) | Some(Token::Lambda) | Some(Token::BigLambda)
        )
    }

    fn parse_poly_term(&mut self) -> Result<Arc<PolyTerm>, ParseError> {
        self.parse_poly_app()
    }

    fn parse_poly_app(&mut self) -> Result<Arc<PolyTerm>, ParseError> {
        let mut left = self.parse_poly_atom()?;
        loop {
            if self.at_poly_atom_start() {
                let right = self.parse_poly_atom()?;
                left = Arc::new(PolyTerm::App(left, right));
            } else if self.eat(Token::LBracket) {
                let ty = self.parse_type()?;
                self.expect(Token::RBracket)?;
                left = Arc::new(PolyTerm::TypeApp(left, ty));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_poly_atom(&mut self) -> Result<Arc<PolyTerm>, ParseError> {
        if self.eat(Token::Lambda) {
            let name = self.expect_ident()?;
            self.expect(Token::Colon)?;
            let ann = self.parse_type()?;
            self.expect(Token::Dot)?;
            let body = self.parse_poly_term()?;
            return Ok(Arc::new(PolyTerm::Abs(name, ann, body)));
        }
        if self.eat(Token::BigLambda) {
            let tv = self.expect_ident()?;
            self.expect(Token::Dot)?;
            let body = self.parse_poly_term()?;
            return Ok(Arc::new(PolyTerm::TAbs(tv, body)));
        }
        if self.eat(Token::LParen) {
            let t = self.parse_poly_term()?;
            self.expect(Token::RParen)?;
            return Ok(t);
        }
        let name = self.expect_ident()?;
        Ok(Arc::new(PolyTerm::Var(name)))
    }

    // ── Typed terms ──────────────────────────────────────────────────────

    fn at_typed_atom_start(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_)) | Some(Token::LParen) | Some(Token::Lambda))
    }

    fn parse_typed_term(&mut self) -> Result<Arc<TypedTerm>, ParseError> {
        self.parse_typed_app()
    }

    fn parse_typed_app(&mut self) -> Result<Arc<TypedTerm>, ParseError> {
        let mut left = self.parse_typed_atom()?;
        while self.at_typed_atom_start() {
            let right = self.parse_typed_atom()?;
            left = Arc::new(TypedTerm::App(left, right));
        }
        Ok(left)
    }

    fn parse_typed_atom(&mut self) -> Result<Arc<TypedTerm>, ParseError> {
        if self.eat(Token::Lambda) {
            let name = self.expect_ident()?;
            self.expect(Token::Colon)?;
            let ann = self.parse_type()?;
            self.expect(Token::Dot)?;
            let body = self.parse_typed_term()?;
            return Ok(Arc::new(TypedTerm::Abs(name, ann, body)));
        }
        if self.eat(Token::LParen) {
            let t = self.parse_typed_term()?;
            self.expect(Token::RParen)?;
            return Ok(t);
        }
        let name = self.expect_ident()?;
        Ok(Arc::new(TypedTerm::Var(name)))
    }

    // ── Untyped terms ────────────────────────────────────────────────────

    fn at_untyped_atom_start(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_)) | Some(Token::LParen) | Some(Token::Lambda))
    }

    fn parse_untyped_term(&mut self) -> Result<Arc<UntypedTerm>, ParseError> {
        self.parse_untyped_app()
    }

    fn parse_untyped_app(&mut self) -> Result<Arc<UntypedTerm>, ParseError> {
        let mut left = self.parse_untyped_atom()?;
        while self.at_untyped_atom_start() {
            let right = self.parse_untyped_atom()?;
            left = Arc::new(UntypedTerm::App(left, right));
        }
        Ok(left)
    }

    fn parse_untyped_atom(&mut self) -> Result<Arc<UntypedTerm>, ParseError> {
        if self.eat(Token::Lambda) {
            let name = self.expect_ident()?;
            self.expect(Token::Dot)?;
            let body = self.parse_untyped_term()?;
            return Ok(Arc::new(UntypedTerm::Abs(name, body)));
        }
        if self.eat(Token::LParen) {
            let t = self.parse_untyped_term()?;
            self.expect(Token::RParen)?;
            return Ok(t);
        }
        let name = self.expect_ident()?;
        Ok(Arc::new(UntypedTerm::Var(name)))
    }

    // ── SKI terms ────────────────────────────────────────────────────────

    fn parse_ski_app(&mut self) -> Result<Arc<SKITerm>, ParseError> {
        let mut left = self.parse_ski_atom()?;
        while matches!(self.peek(), Some(Token::Ident(_)) | Some(Token::LParen)) {
            let right = self.parse_ski_atom()?;
            left = SKITerm::app(left, right);
        }
        Ok(left)
    }

    fn parse_ski_atom(&mut self) -> Result<Arc<SKITerm>, ParseError> {
        if self.eat(Token::LParen) {
            let t = self.parse_ski_app()?;
            self.expect(Token::RParen)?;
            return Ok(t);
        }
        match self.advance() {
            Some(Token::Ident(name)) if name == "S" => Ok(Arc::new(SKITerm::S)),
            Some(Token::Ident(name)) if name == "K" => Ok(Arc::new(SKITerm::K)),
            Some(Token::Ident(name)) if name == "I" => Ok(Arc::new(SKITerm::I)),
            other => Err(ParseError::new(
                self.peek_span(),
                format!("expected one of S, K, I, found {other:?}"),
            )),
        }
    }
}

fn type_contains_forall(ty: &BaseType) -> bool {
    match ty {
        BaseType::TypeVar(_) => false,
        BaseType::Arrow(l, r) | BaseType::TypeApp(l, r) => type_contains_forall(l) || type_contains_forall(r),
        BaseType::Forall(..) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_module_with_untyped_identity() {
        let defs = parse_source("module A\nlet id = \\x. x\nexport id").unwrap();
        assert!(matches!(&defs[0], Definition::Module { name } if name.as_str() == "A"));
        assert!(matches!(&defs[1], Definition::Untyped { name, .. } if name.as_str() == "id"));
        assert!(matches!(&defs[2], Definition::Export { name } if name.as_str() == "id"));
    }

    #[test]
    fn let_with_forall_annotation_is_poly() {
        let defs = parse_source("let id : forall X. X -> X = /\\X. \\x:X. x").unwrap();
        match &defs[0] {
            Definition::Poly { name, rec, .. } => {
                assert_eq!(name.as_str(), "id");
                assert!(!rec);
            }
            other => panic!("expected Poly, got {other:?}"),
        }
    }

    #[test]
    fn let_with_plain_annotation_is_typed() {
        let defs = parse_source("let k : T -> T -> T = \\x:T. \\y:T. x").unwrap();
        assert!(matches!(&defs[0], Definition::Typed { .. }));
    }

    #[test]
    fn fn_sugar_produces_typed_abstraction() {
        let defs = parse_source("fn identity (x : T) = x").unwrap();
        match &defs[0] {
            Definition::Typed { term, .. } => assert!(matches!(term.as_ref(), TypedTerm::Abs(_, _, _))),
            other => panic!("expected Typed, got {other:?}"),
        }
    }

    #[test]
    fn parses_data_declaration_with_multiple_constructors() {
        let defs = parse_source("data Bool = True | False").unwrap();
        match &defs[0] {
            Definition::Data { name, constructors, .. } => {
                assert_eq!(name.as_str(), "Bool");
                assert_eq!(constructors.len(), 2);
            }
            other => panic!("expected Data, got {other:?}"),
        }
    }

    #[test]
    fn parses_ski_definition() {
        let defs = parse_source("ski skk = S K K").unwrap();
        assert!(matches!(&defs[0], Definition::Combinator { .. }));
    }

    #[test]
    fn parses_import_with_alias() {
        let defs = parse_source("import Prelude.zero as z").unwrap();
        match &defs[0] {
            Definition::Import { from, name, r#as } => {
                assert_eq!(from.as_str(), "Prelude");
                assert_eq!(name.as_str(), "zero");
                assert_eq!(r#as.as_ref().unwrap().as_str(), "z");
            }
            other => panic!("expected Import, got {other:?}"),
        }
    }
}
