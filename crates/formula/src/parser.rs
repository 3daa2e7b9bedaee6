//! Recursive-descent parser from tokens to [`EquationNode`] trees.
//!
//! Precedence, lowest first:
//!
//! 1. relations (`=`, `<`, `\le`, `\approx`, ...), left-associative
//! 2. `+` and `-`, left-associative
//! 3. `*` and `/`, left-associative
//! 4. implicit juxtaposition (`2 x`, `\frac{1}{2} m v^2`), right-nested
//! 5. unary minus
//! 6. `^` (right-associative) and `_`
//! 7. atoms: numbers, symbols, groups, `\frac`, `\sqrt`, big operators,
//!    function calls
//!
//! A top-level comma list becomes an undelimited group.

use dossier_core::{BigOpKind, BinOp, Delimiter, EquationNode, Symbol};
use thiserror::Error;

use crate::lexer::{Token, TokenKind, lex};
use crate::symbols;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset of the offending token.
    pub offset: usize,
}

/// Parse one statement of linear notation.
pub fn parse_expression(source: &str) -> Result<EquationNode, ParseError> {
    parse_tokens(source, lex(source))
}

/// Parse an already-lexed token stream, which must end in `Eof`.
pub(crate) fn parse_tokens(source: &str, tokens: Vec<Token>) -> Result<EquationNode, ParseError> {
    let mut parser = Parser::new(source, tokens);
    let node = parser.parse_statement()?;
    if !parser.at(TokenKind::Eof) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(node)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    // ── Token cursor ──────────────────────────────────────────────────────

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> TokenKind {
        self.current().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().cloned().unwrap_or(Token {
            kind: TokenKind::Eof,
            span: Default::default(),
            text: String::new(),
            space_before: false,
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&format!("expected {kind:?}, found {:?}", self.peek())))
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            offset: self.current().map_or(self.source.len(), |t| t.span.start),
        }
    }

    /// Whether the current token can begin an implicit-multiplication operand.
    fn at_atom_start(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Number
                | TokenKind::Ident
                | TokenKind::Command
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::LBraceLit
        )
    }

    // ── Expression layers ─────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<EquationNode, ParseError> {
        let mut items = self.parse_list()?;
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(EquationNode::group(Delimiter::None, items))
        }
    }

    fn parse_list(&mut self) -> Result<Vec<EquationNode>, ParseError> {
        let mut items = vec![self.parse_relation()?];
        while self.at(TokenKind::Comma) {
            self.advance();
            items.push(self.parse_relation()?);
        }
        Ok(items)
    }

    fn parse_relation(&mut self) -> Result<EquationNode, ParseError> {
        let mut left = self.parse_additive()?;
        while let TokenKind::Relation(op) = self.peek() {
            self.advance();
            let right = self.parse_additive()?;
            left = EquationNode::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<EquationNode, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = EquationNode::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<EquationNode, ParseError> {
        let mut left = self.parse_implicit()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_implicit()?;
            left = EquationNode::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_implicit(&mut self) -> Result<EquationNode, ParseError> {
        let first = self.parse_unary()?;
        if self.at_atom_start() {
            let rest = self.parse_implicit()?;
            Ok(EquationNode::binary(BinOp::Mul, first, rest))
        } else {
            Ok(first)
        }
    }

    fn parse_unary(&mut self) -> Result<EquationNode, ParseError> {
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                Ok(EquationNode::neg(self.parse_unary()?))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<EquationNode, ParseError> {
        let mut node = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::Underscore => {
                    self.advance();
                    let index = self.parse_script()?;
                    node = EquationNode::subscript(node, index);
                }
                TokenKind::Caret => {
                    self.advance();
                    let exponent = self.parse_exponent()?;
                    node = EquationNode::power(node, exponent);
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// Exponent after `^`; `a^b^c` nests to the right.
    fn parse_exponent(&mut self) -> Result<EquationNode, ParseError> {
        let base = self.parse_script()?;
        if self.at(TokenKind::Caret) {
            self.advance();
            let exponent = self.parse_exponent()?;
            return Ok(EquationNode::power(base, exponent));
        }
        Ok(base)
    }

    /// The operand of `^` or `_`: a brace group or a single atom.
    fn parse_script(&mut self) -> Result<EquationNode, ParseError> {
        match self.peek() {
            TokenKind::LBrace => self.parse_brace_group(),
            TokenKind::Minus => {
                self.advance();
                Ok(EquationNode::neg(self.parse_script()?))
            }
            TokenKind::Number
            | TokenKind::Ident
            | TokenKind::Command
            | TokenKind::LParen
            | TokenKind::LBracket => self.parse_primary(),
            _ => Err(self.error("expected a script after '^' or '_'")),
        }
    }

    // ── Atoms ─────────────────────────────────────────────────────────────

    fn parse_primary(&mut self) -> Result<EquationNode, ParseError> {
        match self.peek() {
            TokenKind::Number => {
                let token = self.advance();
                Ok(EquationNode::number(token.text))
            }
            TokenKind::Ident => self.parse_ident(),
            TokenKind::Command => self.parse_command(),
            TokenKind::LParen => self.parse_delimited(TokenKind::RParen, Delimiter::Paren),
            TokenKind::LBracket => self.parse_delimited(TokenKind::RBracket, Delimiter::Bracket),
            TokenKind::LBraceLit => self.parse_delimited(TokenKind::RBraceLit, Delimiter::Brace),
            TokenKind::LBrace => self.parse_brace_group(),
            TokenKind::Eof => Err(self.error("unexpected end of expression")),
            other => Err(self.error(&format!("unexpected token {other:?}"))),
        }
    }

    fn parse_ident(&mut self) -> Result<EquationNode, ParseError> {
        let token = self.advance();
        let name = token.text;

        let adjacent_call = self
            .current()
            .is_some_and(|t| t.kind == TokenKind::LParen && !t.space_before);
        if adjacent_call {
            let args = self.parse_call_args()?;
            return Ok(EquationNode::function(name, args));
        }

        if symbols::is_function(&name) {
            return self.parse_function_application(name);
        }

        Ok(symbol_node(&name))
    }

    fn parse_command(&mut self) -> Result<EquationNode, ParseError> {
        let name = self.advance().text;
        match name.as_str() {
            "frac" | "dfrac" | "tfrac" | "cfrac" => {
                let numerator = self.parse_argument()?;
                let denominator = self.parse_argument()?;
                Ok(EquationNode::fraction(numerator, denominator))
            }
            "sqrt" => {
                let degree = if self.at(TokenKind::LBracket) {
                    self.advance();
                    let degree = self.parse_statement()?;
                    self.expect(TokenKind::RBracket)?;
                    Some(degree)
                } else {
                    None
                };
                let radicand = self.parse_argument()?;
                Ok(match degree {
                    Some(degree) => EquationNode::function("root", vec![radicand, degree]),
                    None => EquationNode::function("sqrt", vec![radicand]),
                })
            }
            "sum" => self.parse_big_operator(BigOpKind::Sum),
            "prod" => self.parse_big_operator(BigOpKind::Product),
            "int" => self.parse_big_operator(BigOpKind::Integral),
            n if symbols::is_text_command(n) => {
                let text = self.parse_raw_braced()?;
                Ok(EquationNode::Symbol {
                    symbol: Symbol::named(text),
                })
            }
            n if symbols::is_accent(n) => {
                let arg = self.parse_argument()?;
                Ok(EquationNode::function(name, vec![arg]))
            }
            n if symbols::is_function(n) => self.parse_function_application(name),
            _ => Ok(symbol_node(&name)),
        }
    }

    /// `(a, b, c)` after a function name.
    fn parse_call_args(&mut self) -> Result<Vec<EquationNode>, ParseError> {
        self.expect(TokenKind::LParen)?;
        if self.at(TokenKind::RParen) {
            self.advance();
            return Ok(Vec::new());
        }
        let args = self.parse_list()?;
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// A known function name followed by its argument, e.g. `\ln x`,
    /// `exp(-r t)`. With a subscript (`\max_{p}`) the name becomes a
    /// subscripted symbol and the operand follows by juxtaposition.
    fn parse_function_application(&mut self, name: String) -> Result<EquationNode, ParseError> {
        if self.at(TokenKind::Underscore) {
            self.advance();
            let index = self.parse_script()?;
            return Ok(EquationNode::subscript(
                EquationNode::Symbol {
                    symbol: Symbol::named(name),
                },
                index,
            ));
        }
        if self.at(TokenKind::LParen) {
            let args = self.parse_call_args()?;
            return Ok(EquationNode::function(name, args));
        }
        if matches!(
            self.peek(),
            TokenKind::Number | TokenKind::Ident | TokenKind::Command | TokenKind::LBrace
        ) {
            let arg = self.parse_postfix()?;
            return Ok(EquationNode::function(name, vec![arg]));
        }
        Ok(EquationNode::Symbol {
            symbol: Symbol::named(name),
        })
    }

    fn parse_big_operator(&mut self, kind: BigOpKind) -> Result<EquationNode, ParseError> {
        let mut lower = None;
        let mut upper = None;
        loop {
            match self.peek() {
                TokenKind::Underscore if lower.is_none() => {
                    self.advance();
                    lower = Some(Box::new(self.parse_script()?));
                }
                TokenKind::Caret if upper.is_none() => {
                    self.advance();
                    upper = Some(Box::new(self.parse_script()?));
                }
                _ => break,
            }
        }

        if !(self.at_atom_start() || self.at(TokenKind::Minus)) {
            return Err(self.error("big operator without a body"));
        }
        let body = self.parse_implicit()?;
        Ok(EquationNode::BigOperator {
            kind,
            lower,
            upper,
            body: Box::new(body),
        })
    }

    /// A `{...}` argument or a single atom (`\frac12` style).
    fn parse_argument(&mut self) -> Result<EquationNode, ParseError> {
        if self.at(TokenKind::LBrace) {
            self.parse_brace_group()
        } else {
            self.parse_primary()
        }
    }

    /// `{...}` is invisible: one item is returned as-is, several become an
    /// undelimited group.
    fn parse_brace_group(&mut self) -> Result<EquationNode, ParseError> {
        self.expect(TokenKind::LBrace)?;
        if self.at(TokenKind::RBrace) {
            return Err(self.error("empty group"));
        }
        let mut items = self.parse_list()?;
        self.expect(TokenKind::RBrace)?;
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(EquationNode::group(Delimiter::None, items))
        }
    }

    fn parse_delimited(
        &mut self,
        close: TokenKind,
        delimiter: Delimiter,
    ) -> Result<EquationNode, ParseError> {
        self.advance();
        if self.at(close) {
            return Err(self.error("empty group"));
        }
        let items = self.parse_list()?;
        self.expect(close)?;
        Ok(EquationNode::group(delimiter, items))
    }

    /// Raw source text between `{` and its matching `}`.
    fn parse_raw_braced(&mut self) -> Result<String, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut depth = 1usize;
        loop {
            match self.peek() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        let close = self.advance();
                        let raw = &self.source[open.span.end..close.span.start];
                        return Ok(raw.trim().to_string());
                    }
                }
                TokenKind::Eof => return Err(self.error("unterminated text group")),
                _ => {}
            }
            self.advance();
        }
    }
}

/// Symbol for an identifier: Greek names get their glyph.
fn symbol_node(name: &str) -> EquationNode {
    let symbol = match symbols::glyph(name) {
        Some(glyph) => Symbol::greek(name, glyph),
        None => Symbol::named(name),
    };
    EquationNode::Symbol { symbol }
}
